//! 旁白切分
//!
//! 把一段连续旁白规整为与片段一一对应、每条 20~22 字的旁白单元。
//! 所有函数都是纯函数，网络调用在 application 层完成。

use std::sync::LazyLock;

use regex::Regex;

use super::script::{NarrationUnit, ScriptError, Segment};
use super::text_segmenter::is_sentence_terminal;

/// 单条旁白最小字符数
pub const DEFAULT_MIN_CHARS: usize = 20;
/// 单条旁白最大字符数
pub const DEFAULT_MAX_CHARS: usize = 22;
/// 兜底旁白截取的字符数
pub const DEFAULT_FALLBACK_CHARS: usize = 21;
/// 寻找切分标点时在目标长度两侧搜索的范围
pub const DEFAULT_CUT_WINDOW: usize = 2;

/// 原文为空时用于补齐的字符
const FILLER_CHAR: char = '…';

/// 匹配 "(21字)"、"（20 字）"、"(22 chars)" 这类字数标注
static COUNT_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[（(]\s*\d+\s*(?:个?字|chars?|characters?)\s*[）)]").expect("valid regex")
});

/// 旁白配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationConfig {
    pub min_chars: usize,
    pub max_chars: usize,
    pub fallback_chars: usize,
    pub cut_window: usize,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            max_chars: DEFAULT_MAX_CHARS,
            fallback_chars: DEFAULT_FALLBACK_CHARS,
            cut_window: DEFAULT_CUT_WINDOW,
        }
    }
}

impl NarrationConfig {
    /// N 条旁白的总字数下限
    pub fn min_total(&self, units: usize) -> usize {
        self.min_chars * units
    }

    /// N 条旁白的总字数上限
    pub fn max_total(&self, units: usize) -> usize {
        self.max_chars * units
    }
}

/// 可作为切分点的句中标点
#[inline]
fn is_cut_mark(ch: char) -> bool {
    matches!(ch, '，' | '、' | '；' | '：' | ',' | ';' | ':' | '—')
}

/// 从 primary 开始、接着 secondary 循环取字，直到凑满 count 个字符
fn take_padded(primary: &str, secondary: &str, count: usize) -> String {
    let source: Vec<char> = primary.chars().chain(secondary.chars()).collect();
    if source.is_empty() {
        return std::iter::repeat(FILLER_CHAR).take(count).collect();
    }
    source.iter().cycle().take(count).collect()
}

fn concat_segments(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect()
}

/// 规整模型原始输出：去掉字数标注、句末标点和换行
pub fn normalize(raw: &str) -> String {
    let without_counts = COUNT_ANNOTATION.replace_all(raw, "");
    without_counts
        .chars()
        .filter(|&c| !is_sentence_terminal(c) && c != '\n' && c != '\r')
        .collect::<String>()
        .trim()
        .to_string()
}

/// 修正总长度到 [min*N, max*N]
///
/// 过短时从片段原文拼接串中补字，过长时截断到 max*N。
pub fn repair_total(normalized: &str, segments: &[Segment], config: &NarrationConfig) -> String {
    let units = segments.len();
    let min_total = config.min_total(units);
    let max_total = config.max_total(units);
    let len = normalized.chars().count();

    if len < min_total {
        let mut repaired = normalized.to_string();
        repaired.push_str(&take_padded(
            &concat_segments(segments),
            "",
            min_total - len,
        ));
        repaired
    } else if len > max_total {
        normalized.chars().take(max_total).collect()
    } else {
        normalized.to_string()
    }
}

/// 在 [target-window, target+window] 内寻找句中标点，返回切分后的单元长度
fn find_cut(
    chars: &[char],
    target: usize,
    remaining: usize,
    reserve: usize,
    config: &NarrationConfig,
) -> Option<usize> {
    let mut candidates = vec![target];
    for delta in 1..=config.cut_window {
        if target > delta {
            candidates.push(target - delta);
        }
        candidates.push(target + delta);
    }

    candidates.into_iter().find(|&len| {
        len >= config.min_chars
            && len <= config.max_chars
            && len <= remaining
            && remaining - len >= reserve
            && is_cut_mark(chars[len - 1])
    })
}

/// 把修正后的旁白分配为 N 条
///
/// 除最后一条外，目标长度为 clamp(剩余字数 / 剩余条数, min, max)，
/// 优先在目标附近的句中标点后切开；切点必须为后续单元保留至少 min 字。
/// 最后一条吸收剩余内容，不足时用对应片段原文补齐，超长时回退到标点或硬截断。
pub fn distribute(text: &str, segments: &[Segment], config: &NarrationConfig) -> Vec<NarrationUnit> {
    let count = segments.len();
    if count == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut units = Vec::with_capacity(count);
    let mut pos = 0;

    for (i, segment) in segments.iter().enumerate().take(count - 1) {
        let remaining = chars.len() - pos;
        let remaining_units = count - i;
        let reserve = config.min_chars * (remaining_units - 1);
        let target = (remaining / remaining_units).clamp(config.min_chars, config.max_chars);

        let len = find_cut(&chars[pos..], target, remaining, reserve, config)
            .unwrap_or_else(|| target.min(remaining));

        units.push(NarrationUnit::new(
            segment.index,
            chars[pos..pos + len].iter().collect::<String>(),
        ));
        pos += len;
    }

    let last_segment = &segments[count - 1];
    let mut last: Vec<char> = chars[pos..].to_vec();

    if last.len() < config.min_chars {
        let need = config.min_chars - last.len();
        last.extend(take_padded(&last_segment.text, &concat_segments(segments), need).chars());
    } else if last.len() > config.max_chars {
        let cut = (config.min_chars..=config.max_chars)
            .rev()
            .find(|&len| is_cut_mark(last[len - 1]))
            .unwrap_or(config.max_chars);
        last.truncate(cut);
    }

    units.push(NarrationUnit::new(
        last_segment.index,
        last.into_iter().collect::<String>(),
    ));
    units
}

/// 校验旁白单元：数量与片段一致，且每条长度都在区间内
pub fn validate_units(
    units: &[NarrationUnit],
    expected: usize,
    config: &NarrationConfig,
) -> Result<(), ScriptError> {
    if units.len() != expected {
        return Err(ScriptError::NarrationCountMismatch {
            expected,
            actual: units.len(),
        });
    }
    for (index, unit) in units.iter().enumerate() {
        let len = unit.char_count();
        if len < config.min_chars || len > config.max_chars {
            return Err(ScriptError::NarrationOutOfBand { index, len });
        }
    }
    Ok(())
}

/// 从模型原始输出得到旁白单元：规整 → 修正总长 → 分配 → 校验
pub fn units_from_response(
    raw: &str,
    segments: &[Segment],
    config: &NarrationConfig,
) -> Result<Vec<NarrationUnit>, ScriptError> {
    let normalized = normalize(raw);
    let repaired = repair_total(&normalized, segments, config);
    let units = distribute(&repaired, segments, config);
    validate_units(&units, segments.len(), config)?;
    Ok(units)
}

/// 兜底旁白：每条取对应片段原文的前 fallback_chars 个字
///
/// 片段过短时继续从整章原文中取字补齐。
pub fn fallback_units(segments: &[Segment], config: &NarrationConfig) -> Vec<NarrationUnit> {
    let all_text = concat_segments(segments);
    segments
        .iter()
        .map(|segment| {
            NarrationUnit::new(
                segment.index,
                take_padded(&segment.text, &all_text, config.fallback_chars),
            )
        })
        .collect()
}
