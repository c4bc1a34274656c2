use std::collections::HashSet;

use super::model::ProjectImage;

/// Images present in `old` whose url no longer appears in `new`.
///
/// Urls are the identity the admin client keeps stable across edits, so the
/// comparison ignores `id` and `storage_path`. Old order is preserved and
/// duplicates in `old` are kept as they are.
pub fn orphaned_images<'a>(old: &'a [ProjectImage], new: &[ProjectImage]) -> Vec<&'a ProjectImage> {
    let keep: HashSet<&str> = new.iter().map(|img| img.url.as_str()).collect();

    old.iter()
        .filter(|img| {
            let kept = keep.contains(img.url.as_str());
            tracing::debug!(url = %img.url, kept, "Checked image against new set");
            !kept
        })
        .collect()
}
