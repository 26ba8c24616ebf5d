//! 文本清洗器
//!
//! 合成前的文本清洗流水线。各阶段按固定顺序执行，后面的阶段依赖前面的结果：
//! 1. URL 移除
//! 2. Markdown 标记剥离
//! 3. 自定义关键词移除
//! 4. Emoji 移除
//! 5. 引用角标移除
//! 6. 空白规整

use regex::Regex;
use std::sync::OnceLock;

/// 文本清洗配置
///
/// 每个请求由默认值 + 请求覆盖项构造，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningConfig {
    /// 移除 http(s) 链接
    pub remove_urls: bool,
    /// 剥离 Markdown 标记
    pub remove_markdown: bool,
    /// 移除 Emoji
    pub remove_emoji: bool,
    /// 移除 [1]、【2】 这类引用角标
    pub remove_citation_numbers: bool,
    /// 删除换行
    pub remove_line_breaks: bool,
    /// 自定义关键词，逗号分隔
    pub custom_keywords: String,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            remove_urls: true,
            remove_markdown: true,
            remove_emoji: true,
            remove_citation_numbers: true,
            remove_line_breaks: true,
            custom_keywords: String::new(),
        }
    }
}

impl CleaningConfig {
    /// 全部阶段关闭（只做空白规整）
    pub fn disabled() -> Self {
        Self {
            remove_urls: false,
            remove_markdown: false,
            remove_emoji: false,
            remove_citation_numbers: false,
            remove_line_breaks: false,
            custom_keywords: String::new(),
        }
    }

    /// 构建关键词匹配正则
    ///
    /// 关键词逐个转义后拼接为一个 alternation，空列表返回 None
    pub fn keyword_pattern(&self) -> Option<Regex> {
        let escaped: Vec<String> = self
            .custom_keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        if escaped.is_empty() {
            return None;
        }

        // 已转义，拼接结果必然是合法正则
        Regex::new(&escaped.join("|")).ok()
    }
}

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern is valid"))
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 不吞掉括号，Markdown 的 `[text](url)` 留给下一阶段处理
    cached(&RE, r"https?://[^\s()<>]+")
}

struct MarkdownRules {
    fence: Regex,
    image: Regex,
    link: Regex,
    bold_star: Regex,
    italic_star: Regex,
    underscore: Regex,
    strike: Regex,
    inline_code: Regex,
    heading: Regex,
    blockquote: Regex,
}

fn markdown_rules() -> &'static MarkdownRules {
    static RULES: OnceLock<MarkdownRules> = OnceLock::new();
    RULES.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static pattern is valid");
        MarkdownRules {
            fence: re(r"```[A-Za-z0-9_+\-]*"),
            image: re(r"!\[[^\]]*\]\([^)]*\)"),
            link: re(r"\[([^\]]+)\]\([^)]*\)"),
            bold_star: re(r"\*\*([^*\n]+)\*\*"),
            italic_star: re(r"\*([^*\n]+)\*"),
            underscore: re(r"(^|[^\w])_{1,2}([^_\n]+?)_{1,2}([^\w]|$)"),
            strike: re(r"~~([^~\n]+)~~"),
            inline_code: re(r"`+"),
            heading: re(r"(?m)^[ \t]*#{1,6}[ \t]+"),
            blockquote: re(r"(?m)^[ \t]*>[ \t]?"),
        }
    })
}

fn emoji_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(
        &RE,
        r"\p{Emoji_Presentation}\x{FE0F}?(?:\x{200D}\p{Extended_Pictographic}\x{FE0F}?)*",
    )
}

fn bracket_citation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\[\d{1,3}\]|【\d{1,3}】|［\d{1,3}］")
}

/// 紧贴在单词句末标点后的裸数字角标，如 `done.12 Next`
///
/// 西文标点后要求下一个词大写或到达文本末尾，`Fig.3 shows` 这类缩写编号保留
fn trailing_citation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"([^\d\s][.!?])\d{1,3}(\s+\p{Lu}|\s*$)")
}

/// 中文句末标点后的裸数字角标，如 `成立。3后续`
fn cjk_trailing_citation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"([。！？])\d{1,3}(\D|$)")
}

fn line_break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"[\r\n]+")
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\s+")
}

fn horizontal_whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"[^\S\r\n]+")
}

fn strip_markdown(text: &str) -> String {
    let rules = markdown_rules();
    let text = rules.fence.replace_all(text, "");
    let text = rules.image.replace_all(&text, "");
    let text = rules.link.replace_all(&text, "$1");
    let text = rules.bold_star.replace_all(&text, "$1");
    let text = rules.italic_star.replace_all(&text, "$1");
    let text = rules.underscore.replace_all(&text, "$1$2$3");
    let text = rules.strike.replace_all(&text, "$1");
    let text = rules.inline_code.replace_all(&text, "");
    let text = rules.heading.replace_all(&text, "");
    rules.blockquote.replace_all(&text, "").into_owned()
}

fn remove_citations(text: &str) -> String {
    // 嵌套角标（`[1[2]]`）去掉内层后会露出外层，反复替换直到不再变化
    let mut text = text.to_string();
    loop {
        let next = strip_citations_once(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

fn strip_citations_once(text: &str) -> String {
    let text = bracket_citation_regex().replace_all(text, "");
    let text = trailing_citation_regex().replace_all(&text, "$1$2");
    cjk_trailing_citation_regex()
        .replace_all(&text, "$1$2")
        .into_owned()
}

fn normalize_whitespace(text: &str, remove_line_breaks: bool) -> String {
    if remove_line_breaks {
        let text = line_break_regex().replace_all(text, "");
        whitespace_regex().replace_all(&text, " ").trim().to_string()
    } else {
        horizontal_whitespace_regex()
            .replace_all(text, " ")
            .trim()
            .to_string()
    }
}

/// 执行完整清洗流水线
///
/// 清洗后为空是合法结果，分段器会产出零个片段
pub fn normalize(text: &str, config: &CleaningConfig) -> String {
    let mut text = text.to_string();

    if config.remove_urls {
        text = url_regex().replace_all(&text, "").into_owned();
    }

    if config.remove_markdown {
        text = strip_markdown(&text);
    }

    if let Some(keywords) = config.keyword_pattern() {
        text = keywords.replace_all(&text, "").into_owned();
    }

    if config.remove_emoji {
        text = emoji_regex().replace_all(&text, "").into_owned();
    }

    if config.remove_citation_numbers {
        text = remove_citations(&text);
    }

    normalize_whitespace(&text, config.remove_line_breaks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_on_with(keywords: &str) -> CleaningConfig {
        CleaningConfig {
            custom_keywords: keywords.to_string(),
            ..CleaningConfig::default()
        }
    }

    #[test]
    fn test_end_to_end_sample() {
        let config = all_on_with("See");
        let text = "Hello, world! [1] See https://x.co 😊";
        assert_eq!(normalize(text, &config), "Hello, world!");
    }

    #[test]
    fn test_url_removal() {
        let config = CleaningConfig {
            remove_urls: true,
            ..CleaningConfig::disabled()
        };
        assert_eq!(
            normalize("看这里 http://a.b/c?d=1 和 https://x.y", &config),
            "看这里 和"
        );
    }

    #[test]
    fn test_markdown_stripping() {
        let config = CleaningConfig {
            remove_markdown: true,
            ..CleaningConfig::disabled()
        };
        let text = "# Title\n**bold** and *it* with [link](http://x) ![img](a.png) `code`";
        assert_eq!(normalize(text, &config), "Title\nbold and it with link code");
    }

    #[test]
    fn test_markdown_keeps_snake_case() {
        let config = CleaningConfig {
            remove_markdown: true,
            ..CleaningConfig::disabled()
        };
        assert_eq!(normalize("call my_func now", &config), "call my_func now");
        assert_eq!(normalize("this is __strong__ text", &config), "this is strong text");
    }

    #[test]
    fn test_fenced_code_markers() {
        let config = CleaningConfig {
            remove_markdown: true,
            remove_line_breaks: true,
            ..CleaningConfig::disabled()
        };
        assert_eq!(normalize("```rust\nlet x = 1;\n```", &config), "let x = 1;");
    }

    #[test]
    fn test_keywords_are_escaped() {
        let config = CleaningConfig {
            custom_keywords: " a.b , (x) ,, ".to_string(),
            ..CleaningConfig::disabled()
        };
        // "." 不应作为通配符
        assert_eq!(normalize("a.b axb (x) x", &config), "axb x");
    }

    #[test]
    fn test_empty_keyword_list_is_noop() {
        assert!(CleaningConfig::disabled().keyword_pattern().is_none());
        let config = CleaningConfig {
            custom_keywords: " , ,".to_string(),
            ..CleaningConfig::disabled()
        };
        assert!(config.keyword_pattern().is_none());
    }

    #[test]
    fn test_emoji_removal() {
        let config = CleaningConfig {
            remove_emoji: true,
            ..CleaningConfig::disabled()
        };
        assert_eq!(normalize("好的😊👍🏽 ok 123", &config), "好的 ok 123");
    }

    #[test]
    fn test_citation_removal() {
        let config = CleaningConfig {
            remove_citation_numbers: true,
            ..CleaningConfig::disabled()
        };
        assert_eq!(normalize("结论【3】成立[12]。", &config), "结论成立。");
        assert_eq!(normalize("It works.2 Next", &config), "It works. Next");
        assert_eq!(normalize("pi is 3.14 and [1234] stays", &config), "pi is 3.14 and [1234] stays");
        assert_eq!(normalize("共 42 人", &config), "共 42 人");
        assert_eq!(normalize("结论成立。3后续", &config), "结论成立。后续");
        assert_eq!(normalize("见上文。2024年", &config), "见上文。2024年");
        assert_eq!(normalize("the end.7", &config), "the end.");
    }

    #[test]
    fn test_abbreviation_numbers_kept() {
        let config = CleaningConfig {
            remove_citation_numbers: true,
            ..CleaningConfig::disabled()
        };
        assert_eq!(normalize("Fig.3 shows it", &config), "Fig.3 shows it");
        assert_eq!(normalize("see No.5 below", &config), "see No.5 below");
    }

    #[test]
    fn test_nested_citations_removed() {
        let config = CleaningConfig {
            remove_citation_numbers: true,
            ..CleaningConfig::disabled()
        };
        assert_eq!(normalize("x [1[2]] y", &config), "x y");
        assert_eq!(normalize("a【1【2】】b", &config), "ab");
    }

    #[test]
    fn test_markdown_links_to_urls_under_defaults() {
        let config = CleaningConfig::default();
        assert_eq!(normalize("See [docs](https://example.com/a) now", &config), "See docs now");
        assert_eq!(normalize("![a](https://i.png)", &config), "");
        assert_eq!(
            normalize("参见[文档](http://d)。", &config),
            "参见文档。"
        );
    }

    #[test]
    fn test_line_breaks_removed() {
        let config = CleaningConfig {
            remove_line_breaks: true,
            ..CleaningConfig::disabled()
        };
        assert_eq!(normalize("第一行\n第二行\r\n  第三行", &config), "第一行第二行 第三行");
    }

    #[test]
    fn test_line_breaks_preserved() {
        let config = CleaningConfig::disabled();
        assert_eq!(normalize("  a \t b\nc   d  ", &config), "a b\nc d");
    }

    #[test]
    fn test_empty_after_cleaning() {
        let config = CleaningConfig::default();
        assert_eq!(normalize("https://only.url 😊", &config), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Hello, world! [1] See https://x.co 😊",
            "# 标题\n\n**粗体** 与 _斜体_，参见[文档](http://d)。[2]\n> 引用",
            "多个   空格\t\t和\n\n换行 😀😀",
            "x [1[2]] y",
            "Fig.3 shows it.4 Then",
        ];
        for config in [CleaningConfig::default(), CleaningConfig::disabled(), all_on_with("参见")] {
            for sample in samples {
                let once = normalize(sample, &config);
                let twice = normalize(&once, &config);
                assert_eq!(once, twice, "not idempotent for {:?}", sample);
            }
        }
    }
}
