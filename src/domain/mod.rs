//! Domain Layer - 领域层
//!
//! 纯函数部分，不做任何 IO：
//! - 文本清洗（text_cleaner）
//! - 文本分段（text_segmenter）
//! - 音色参数（voice）
//! - SSML 构建（ssml）

pub mod ssml;
pub mod text_cleaner;
pub mod text_segmenter;
pub mod voice;

pub use ssml::build_ssml;
pub use text_cleaner::{normalize, CleaningConfig};
pub use text_segmenter::{chunk_text, TextChunk, DEFAULT_MAX_CHUNK_LEN};
pub use voice::{resolve_voice, VoiceParams, DEFAULT_VOICE};
