//! Configuration section definitions.
//!
//! Each module corresponds to a section in `blaze.toml`:
//!
//! | Module     | TOML Section   | Purpose                                  |
//! |------------|----------------|------------------------------------------|
//! | `images`   | `[images]`     | Candidate selection, formats, envelope   |
//! | `search`   | `[search]`     | Quality search policy overrides          |
//! | `rename`   | `[rename]`     | Id assignment and manifest               |
//! | `cache`    | `[cache]`      | Transcode cache bound                    |
//! | `pipeline` | `[pipeline]`   | Stage order and worker pool              |

mod cache;
mod images;
mod pipeline;
mod rename;
mod search;

pub use cache::CacheConfig;
pub use images::ImagesConfig;
pub use pipeline::{KNOWN_STAGES, PipelineConfig};
pub use rename::RenameConfig;
pub use search::SearchConfig;
