// Images and the blob-side lifecycle of their objects.
pub mod diff;
pub mod model;
pub mod path;
pub mod reaper;

pub use diff::orphaned_images;
pub use model::ProjectImage;
pub use path::{resolve_asset_path, AssetPath, Unresolvable};
pub use reaper::{Reaper, ReaperConfig};
