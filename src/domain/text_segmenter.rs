//! 文本分割器
//!
//! 把清洗后的文本切成有长度上限、尽量按句子边界断开的片段，保持原有顺序

/// 默认单片段最大字符数
pub const DEFAULT_MAX_CHUNK_LEN: usize = 2000;

/// 待合成的文本片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// 片段序号（从 0 开始，连续）
    pub index: usize,
    /// 片段文本
    pub content: String,
}

impl TextChunk {
    pub fn new(index: usize, content: impl Into<String>) -> Self {
        Self {
            index,
            content: content.into(),
        }
    }

    /// 字符数
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// 检查是否为强分隔符（句末标点）
#[inline]
fn is_strong_delimiter(ch: char) -> bool {
    matches!(ch, '。' | '？' | '！' | '.' | '?' | '!' | '\n')
}

/// 检查是否为弱分隔符（分句标点）
#[inline]
fn is_weak_delimiter(ch: char) -> bool {
    matches!(ch, '，' | '；' | '：' | ',' | ';' | ':')
}

#[inline]
fn is_delimiter(ch: char) -> bool {
    is_strong_delimiter(ch) || is_weak_delimiter(ch)
}

/// 检查片段是否只包含空白（应该被丢弃）
#[inline]
fn is_trivial_segment(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

/// 按分隔符切分，分隔符（连续的一串）保留在前一段末尾
fn split_by_delimiters(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_delimiters = false;

    for (pos, ch) in text.char_indices() {
        if is_delimiter(ch) {
            in_delimiters = true;
        } else if in_delimiters {
            pieces.push(&text[start..pos]);
            start = pos;
            in_delimiters = false;
        }
    }

    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

/// 按固定字符宽度切分
fn fixed_width_slices(text: &str, width: usize) -> Vec<&str> {
    let mut slices = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (pos, _) in text.char_indices() {
        if count == width {
            slices.push(&text[start..pos]);
            start = pos;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        slices.push(&text[start..]);
    }

    slices
}

/// 片段收集器，负责编号与丢弃空白片段
struct ChunkCollector {
    chunks: Vec<TextChunk>,
    buffer: String,
    buffer_chars: usize,
}

impl ChunkCollector {
    fn new() -> Self {
        Self {
            chunks: Vec::new(),
            buffer: String::new(),
            buffer_chars: 0,
        }
    }

    fn push(&mut self, content: &str) {
        if is_trivial_segment(content) {
            return;
        }
        let index = self.chunks.len();
        self.chunks.push(TextChunk::new(index, content));
    }

    fn flush(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        self.buffer_chars = 0;
        self.push(&buffer);
    }
}

/// 对文本进行分段
///
/// 分段策略：
/// 1. 在分隔符（ASCII 与中文标点、换行）之后切开，分隔符随前一段保留
/// 2. 贪心累积，追加下一段会超出 `max_len` 时先输出缓冲区
/// 3. 单段超过 `max_len`（没有可用的分隔符）时按 `max_len` 定宽切分
/// 4. 只含空白的片段被丢弃，其余内容原样保留
///
/// 长度按字符（Unicode scalar）计算
pub fn chunk_text(text: &str, max_len: usize) -> Vec<TextChunk> {
    let max_len = max_len.max(1);
    let mut collector = ChunkCollector::new();

    for piece in split_by_delimiters(text) {
        let piece_chars = piece.chars().count();

        if collector.buffer_chars > 0 && collector.buffer_chars + piece_chars > max_len {
            collector.flush();
        }

        if piece_chars > max_len {
            let mut slices = fixed_width_slices(piece, max_len);
            let tail = slices.pop();
            for slice in slices {
                collector.push(slice);
            }
            if let Some(tail) = tail {
                collector.buffer.push_str(tail);
                collector.buffer_chars = tail.chars().count();
            }
        } else {
            collector.buffer.push_str(piece);
            collector.buffer_chars += piece_chars;
        }
    }

    collector.flush();
    collector.chunks
}
