//! SSML 标记构建
//!
//! 每个片段包装成 voice / express-as / prosody 三层标记后发往上游

use super::voice::VoiceParams;

/// 转义片段文本，只处理 `&` `<` `>`，其余字符原样保留
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// 属性值转义（音色名等来自请求，同样不可信）
fn escape_attr(value: &str) -> String {
    escape_text(value)
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// 构建单个片段的 SSML 文档
pub fn build_ssml(text: &str, voice: &VoiceParams) -> String {
    let role = if voice.role.is_empty() {
        String::new()
    } else {
        format!(" role=\"{}\"", escape_attr(&voice.role))
    };

    format!(
        concat!(
            "<speak xmlns=\"http://www.w3.org/2001/10/synthesis\" ",
            "xmlns:mstts=\"http://www.w3.org/2001/mstts\" version=\"1.0\" xml:lang=\"{lang}\">",
            "<voice name=\"{voice}\">",
            "<mstts:express-as style=\"{style}\" styledegree=\"{degree:.2}\"{role}>",
            "<prosody rate=\"{rate}%\" pitch=\"{pitch}%\">{text}</prosody>",
            "</mstts:express-as></voice></speak>"
        ),
        lang = escape_attr(&voice.locale()),
        voice = escape_attr(&voice.voice),
        style = escape_attr(&voice.style),
        degree = voice.style_degree,
        role = role,
        rate = voice.rate,
        pitch = voice.pitch,
        text = escape_text(text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text_only_markup_chars() {
        assert_eq!(escape_text("a & b <c> \"d\" 'e'"), "a &amp; b &lt;c&gt; \"d\" 'e'");
    }

    #[test]
    fn test_build_ssml_layout() {
        let voice = VoiceParams::new("zh-CN-YunxiNeural").with_speed(1.1).with_pitch(0.95);
        let ssml = build_ssml("你好 <世界>", &voice);

        assert!(ssml.starts_with("<speak "));
        assert!(ssml.contains("xml:lang=\"zh-CN\""));
        assert!(ssml.contains("<voice name=\"zh-CN-YunxiNeural\">"));
        assert!(ssml.contains("style=\"general\" styledegree=\"1.00\">"));
        assert!(ssml.contains("<prosody rate=\"10%\" pitch=\"-5%\">你好 &lt;世界&gt;</prosody>"));
        assert!(!ssml.contains("role="));
        assert!(ssml.ends_with("</mstts:express-as></voice></speak>"));
    }

    #[test]
    fn test_build_ssml_with_role() {
        let voice = VoiceParams::default().with_role("YoungAdultFemale");
        let ssml = build_ssml("hi", &voice);
        assert!(ssml.contains(" role=\"YoungAdultFemale\">"));
    }

    #[test]
    fn test_attributes_cannot_break_out() {
        let voice = VoiceParams::new("x\"><evil/>");
        let ssml = build_ssml("hi", &voice);
        assert!(!ssml.contains("<evil/>"));
    }
}
