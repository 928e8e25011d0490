//! Video file resolution and link unlocking.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::metrics::UNLOCK_FAILURES;

use super::types::{DebridError, DebridService, UnlockedLink, VideoFile};

/// Extensions treated as playable video, lowercase.
pub const VIDEO_EXTENSIONS: [&str; 8] = [
    ".mp4", ".mkv", ".avi", ".mov", ".flv", ".wmv", ".webm", ".m4v",
];

/// Case-insensitive extension check.
pub fn is_video_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Playable files of an item, in listing order.
pub async fn resolve_video_files(
    service: &dyn DebridService,
    item_id: &str,
) -> Result<Vec<VideoFile>, DebridError> {
    if item_id.trim().is_empty() {
        return Err(DebridError::InvalidRequest("item id required".to_string()));
    }

    let files = service.item_files(item_id).await?;
    let total = files.len();

    let videos: Vec<VideoFile> = files
        .into_iter()
        .filter(|f| is_video_file(&f.name))
        .map(|f| VideoFile {
            name: f.name,
            url: f.link,
        })
        .collect();

    debug!(item_id = %item_id, total, videos = videos.len(), "Resolved item files");

    if videos.is_empty() {
        return Err(DebridError::EmptyResult("no video files found".to_string()));
    }
    Ok(videos)
}

/// Unlock every file, keeping input order and skipping failures.
///
/// Fails only when no file could be unlocked.
pub async fn unlock_all(
    service: &dyn DebridService,
    files: &[VideoFile],
) -> Result<Vec<UnlockedLink>, DebridError> {
    let unlocks = files.iter().map(|file| async move {
        let result = service.unlock_link(&file.url).await;
        (file, result)
    });

    let links: Vec<UnlockedLink> = join_all(unlocks)
        .await
        .into_iter()
        .filter_map(|(file, result)| match result {
            Ok(url) => Some(UnlockedLink {
                filename: file.name.clone(),
                url: unescape_slashes(&url),
            }),
            Err(e) => {
                warn!(file = %file.name, error = %e, "Could not unlock link");
                UNLOCK_FAILURES.inc();
                None
            }
        })
        .collect();

    if links.is_empty() {
        return Err(DebridError::EmptyResult(
            "could not unlock any links".to_string(),
        ));
    }
    Ok(links)
}

/// Resolve an item's video files and unlock them.
pub async fn resolve_and_unlock(
    service: &dyn DebridService,
    item_id: &str,
) -> Result<Vec<UnlockedLink>, DebridError> {
    let videos = resolve_video_files(service, item_id).await?;
    unlock_all(service, &videos).await
}

/// `https:\/\/host\/path` -> `https://host/path`
pub fn unescape_slashes(url: &str) -> String {
    url.replace("\\/", "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debrid::DebridFile;
    use crate::testing::MockDebridService;

    fn file(name: &str, link: &str) -> DebridFile {
        DebridFile {
            name: name.to_string(),
            link: link.to_string(),
        }
    }

    fn video(name: &str, url: &str) -> VideoFile {
        VideoFile {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file("Movie.MKV"));
        assert!(is_video_file("a.b.webm"));
        assert!(is_video_file("clip.m4v"));
        assert!(!is_video_file("readme.txt"));
        assert!(!is_video_file("sample.mkv.part"));
        assert!(!is_video_file("mkv"));
    }

    #[test]
    fn test_unescape_slashes() {
        assert_eq!(
            unescape_slashes(r"https:\/\/host\/path"),
            "https://host/path"
        );
        assert_eq!(unescape_slashes("https://plain/x"), "https://plain/x");
    }

    #[tokio::test]
    async fn test_resolve_filters_videos() {
        let service = MockDebridService::new();
        service
            .set_files(
                "42",
                vec![
                    file("movie.mkv", "l1"),
                    file("movie.nfo", "l2"),
                    file("extra.MP4", "l3"),
                ],
            )
            .await;

        let videos = resolve_video_files(&service, "42").await.unwrap();
        assert_eq!(videos, vec![video("movie.mkv", "l1"), video("extra.MP4", "l3")]);
    }

    #[tokio::test]
    async fn test_resolve_without_videos_is_empty_result() {
        let service = MockDebridService::new();
        service
            .set_files("42", vec![file("readme.txt", "l1")])
            .await;

        let err = resolve_video_files(&service, "42").await.unwrap_err();
        assert!(matches!(err, DebridError::EmptyResult(ref m) if m == "no video files found"));
    }

    #[tokio::test]
    async fn test_resolve_propagates_transport_error() {
        let service = MockDebridService::new();
        service
            .set_next_error(DebridError::Unreachable("down".into()))
            .await;

        let err = resolve_video_files(&service, "42").await.unwrap_err();
        assert!(matches!(err, DebridError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_unlock_all_skips_failed_file() {
        let service = MockDebridService::new();
        service.set_unlock("l1", "https://dl/1").await;
        service.fail_unlock("l2").await;
        service.set_unlock("l3", r"https:\/\/dl\/3").await;

        let files = vec![video("a.mkv", "l1"), video("b.mkv", "l2"), video("c.mkv", "l3")];
        let links = unlock_all(&service, &files).await.unwrap();

        assert_eq!(
            links,
            vec![
                UnlockedLink {
                    filename: "a.mkv".to_string(),
                    url: "https://dl/1".to_string()
                },
                UnlockedLink {
                    filename: "c.mkv".to_string(),
                    url: "https://dl/3".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_unlock_all_fails_when_nothing_unlocks() {
        let service = MockDebridService::new();
        service.fail_unlock("l1").await;

        let err = unlock_all(&service, &[video("a.mkv", "l1")])
            .await
            .unwrap_err();
        assert!(matches!(err, DebridError::EmptyResult(ref m) if m == "could not unlock any links"));
    }

    #[tokio::test]
    async fn test_resolve_and_unlock() {
        let service = MockDebridService::new();
        service
            .set_files("7", vec![file("ep1.avi", "l1"), file("cover.jpg", "l2")])
            .await;
        service.set_unlock("l1", "https://dl/ep1").await;

        let links = resolve_and_unlock(&service, "7").await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].filename, "ep1.avi");
        assert_eq!(service.unlocked_links().await, vec!["l1".to_string()]);
    }
}
