//! 合成音色参数
//!
//! 每个请求解析一次，所有片段只读共享

/// 默认音色
pub const DEFAULT_VOICE: &str = "zh-CN-XiaoxiaoNeural";

/// 默认说话风格
pub const DEFAULT_STYLE: &str = "general";

/// 风格强度范围
const STYLE_DEGREE_MIN: f32 = 0.01;
const STYLE_DEGREE_MAX: f32 = 2.0;

/// OpenAI 音色名到神经网络音色的映射
const OPENAI_VOICE_MAP: &[(&str, &str)] = &[
    ("alloy", "zh-CN-XiaoxiaoNeural"),
    ("echo", "zh-CN-YunxiNeural"),
    ("fable", "zh-CN-YunjianNeural"),
    ("onyx", "zh-CN-XiaoyiNeural"),
    ("nova", "zh-CN-YunyangNeural"),
    ("shimmer", "zh-CN-XiaohanNeural"),
];

/// 解析音色名：OpenAI 音色名做映射，其他原样透传
pub fn resolve_voice(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return DEFAULT_VOICE.to_string();
    }
    OPENAI_VOICE_MAP
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        .map(|(_, voice)| voice.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// 倍率（1.0 为原速）换算为百分比偏移
pub fn multiplier_to_percent(multiplier: f32) -> i32 {
    if !multiplier.is_finite() {
        return 0;
    }
    ((multiplier - 1.0) * 100.0).round() as i32
}

/// 合成音色参数
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    /// 神经网络音色名，如 zh-CN-XiaoxiaoNeural
    pub voice: String,
    /// 语速偏移（百分比）
    pub rate: i32,
    /// 音调偏移（百分比）
    pub pitch: i32,
    /// 说话风格
    pub style: String,
    /// 角色扮演，空字符串表示不指定
    pub role: String,
    /// 风格强度
    pub style_degree: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            rate: 0,
            pitch: 0,
            style: DEFAULT_STYLE.to_string(),
            role: String::new(),
            style_degree: 1.0,
        }
    }
}

impl VoiceParams {
    pub fn new(voice: &str) -> Self {
        Self {
            voice: resolve_voice(voice),
            ..Default::default()
        }
    }

    /// 以倍率设置语速
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.rate = multiplier_to_percent(speed);
        self
    }

    /// 以倍率设置音调
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = multiplier_to_percent(pitch);
        self
    }

    pub fn with_style(mut self, style: &str) -> Self {
        let style = style.trim();
        self.style = if style.is_empty() {
            DEFAULT_STYLE.to_string()
        } else {
            style.to_string()
        };
        self
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = role.trim().to_string();
        self
    }

    pub fn with_style_degree(mut self, degree: f32) -> Self {
        self.style_degree = if degree.is_finite() {
            degree.clamp(STYLE_DEGREE_MIN, STYLE_DEGREE_MAX)
        } else {
            1.0
        };
        self
    }

    /// 音色对应的语言标签（en-US-AriaNeural → en-US）
    pub fn locale(&self) -> String {
        let mut parts = self.voice.splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(lang), Some(region), Some(_)) if !lang.is_empty() && !region.is_empty() => {
                format!("{}-{}", lang, region)
            }
            _ => "zh-CN".to_string(),
        }
    }
}
