//! Magnet construction from `.torrent` metainfo.
//!
//! Uses librqbit-core to parse the bencoded data; nothing is downloaded.

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};
use serde::{Deserialize, Serialize};

use super::DebridError;

/// A magnet URI derived from a `.torrent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMagnet {
    pub magnet: String,
    /// Lowercase hex info hash.
    pub info_hash: String,
    pub name: String,
}

/// Build a magnet from `.torrent` bytes.
///
/// The display name is the torrent's own name, else `fallback_name`, else
/// `torrent`. Every announce URL is appended as a `tr` parameter, primary
/// announce first, duplicates dropped.
pub fn magnet_from_torrent(
    bytes: &[u8],
    fallback_name: Option<&str>,
) -> Result<ExtractedMagnet, DebridError> {
    let torrent: TorrentMetaV1Owned = torrent_from_bytes(bytes)
        .map_err(|e| DebridError::ParseFailure(format!("invalid torrent: {}", e)))?;

    let info_hash = torrent.info_hash.as_string();

    let name = torrent
        .info
        .name
        .as_ref()
        .map(|b| bytes_to_string(b.as_ref()))
        .filter(|n| !n.trim().is_empty())
        .or_else(|| {
            fallback_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "torrent".to_string());

    let mut trackers: Vec<String> = Vec::new();
    let announces = torrent
        .announce
        .iter()
        .chain(torrent.announce_list.iter().flatten());
    for announce in announces {
        let tracker = bytes_to_string(announce.as_ref());
        if !tracker.is_empty() && !trackers.contains(&tracker) {
            trackers.push(tracker);
        }
    }

    Ok(ExtractedMagnet {
        magnet: build_magnet(&info_hash, &name, &trackers),
        info_hash,
        name,
    })
}

/// `magnet:?xt=urn:btih:<hash>&dn=<name>&tr=<tracker>...`
pub fn build_magnet(info_hash: &str, name: &str, trackers: &[String]) -> String {
    let mut magnet = format!(
        "magnet:?xt=urn:btih:{}&dn={}",
        info_hash,
        urlencoding::encode(name)
    );
    for tracker in trackers {
        magnet.push_str("&tr=");
        magnet.push_str(&urlencoding::encode(tracker));
    }
    magnet
}

/// UTF-8, lossily where needed.
fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::torrent_bytes;

    #[test]
    fn test_build_magnet_encodes_parts() {
        let magnet = build_magnet(
            "abc",
            "My Movie (2024)",
            &["udp://t:80/announce".to_string()],
        );
        assert_eq!(
            magnet,
            "magnet:?xt=urn:btih:abc&dn=My%20Movie%20%282024%29&tr=udp%3A%2F%2Ft%3A80%2Fannounce"
        );
    }

    #[test]
    fn test_magnet_from_torrent() {
        let extracted = magnet_from_torrent(&torrent_bytes("file.mkv"), Some("ignored")).unwrap();

        assert_eq!(extracted.name, "file.mkv");
        assert_eq!(extracted.info_hash.len(), 40);
        assert!(extracted
            .magnet
            .starts_with(&format!("magnet:?xt=urn:btih:{}&dn=file.mkv", extracted.info_hash)));
        assert_eq!(extracted.magnet.matches("&tr=").count(), 2);
        assert!(extracted.magnet.contains("tracker.one"));
        assert!(extracted.magnet.contains("tracker.two"));
    }

    #[test]
    fn test_invalid_torrent_is_parse_failure() {
        let err = magnet_from_torrent(b"<html>not a torrent</html>", None).unwrap_err();
        assert!(matches!(err, DebridError::ParseFailure(_)));
    }

    #[test]
    fn test_bytes_to_string_lossy() {
        let invalid = vec![0xff, 0xfe, b'h', b'i'];
        assert!(bytes_to_string(&invalid).ends_with("hi"));
    }
}
