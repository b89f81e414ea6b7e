//! 文本分割器
//!
//! 将一章正文切分为固定数量、长度落在目标区间内的片段。
//! 这里是确定性的兜底路径：同样的输入永远得到同样的输出。

use super::script::Segment;

/// 片段最小字符数
pub const DEFAULT_MIN_CHARS: usize = 50;
/// 片段目标字符数
pub const DEFAULT_TARGET_CHARS: usize = 55;
/// 片段最大字符数
pub const DEFAULT_MAX_CHARS: usize = 60;
/// 每章最少场景数
pub const DEFAULT_MIN_SEGMENTS: usize = 5;
/// 回填剩余句子时允许超出最大字符数的余量
pub const OVERFLOW_SLACK: usize = 10;

/// 文本分割配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmenterConfig {
    pub min_chars: usize,
    pub target_chars: usize,
    pub max_chars: usize,
    /// 每章最少片段数
    pub min_segments: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            target_chars: DEFAULT_TARGET_CHARS,
            max_chars: DEFAULT_MAX_CHARS,
            min_segments: DEFAULT_MIN_SEGMENTS,
        }
    }
}

/// 检查是否为句末标点
#[inline]
pub(crate) fn is_sentence_terminal(ch: char) -> bool {
    matches!(ch, '。' | '？' | '！' | '.' | '?' | '!' | '…')
}

/// 句末标点之后仍属于本句的收尾符号（引号、括号）
#[inline]
fn is_closing_mark(ch: char) -> bool {
    matches!(
        ch,
        '"' | '\u{201D}' | '\u{2019}' | '」' | '』' | '）' | ')'
    )
}

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 按句末标点切分完整句子，标点保留在句尾
///
/// 连续的句末标点（如 "……"、"！？"）和紧随其后的收尾引号归入同一句；
/// 换行同样视为句子边界，避免章节标题与正文粘连。
/// 句后的空白和换行附着在该句末尾，开头的空白附着在第一句，
/// 因此所有句子按序拼接后与原文完全一致。
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);

        let boundary = if ch == '\n' || ch == '\r' {
            true
        } else if is_sentence_terminal(ch) {
            while let Some(&next) = chars.peek() {
                if is_sentence_terminal(next) || is_closing_mark(next) {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            true
        } else {
            false
        };

        if !boundary {
            continue;
        }

        while let Some(&next) = chars.peek() {
            if next.is_whitespace() {
                current.push(next);
                chars.next();
            } else {
                break;
            }
        }

        // 只有空白时继续累积，归入下一句
        if !current.trim().is_empty() {
            sentences.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        match sentences.last_mut() {
            Some(last) if current.trim().is_empty() => last.push_str(&current),
            _ => sentences.push(current),
        }
    }

    sentences
}

/// 计算一章应切分的片段数：max(min_segments, ceil(字符数 / target))
pub fn desired_segment_count(char_count: usize, config: &SegmenterConfig) -> usize {
    let target = config.target_chars.max(1);
    config.min_segments.max(char_count.div_ceil(target))
}

/// 确定性分段
///
/// 1. 按句切分
/// 2. 前 desired_count-1 个槽位：先累积整句直到 >= min，
///    再在不超过 max 的前提下继续累积，达到 target 即停
/// 3. 最后一个槽位吸收剩余全部句子
/// 4. 若仍有剩余句子，轮询回填到已有片段
///
/// 返回的片段数恒等于 desired_count，每个句子恰好出现一次。
pub fn segment_fallback(
    text: &str,
    desired_count: usize,
    config: &SegmenterConfig,
) -> Vec<Segment> {
    if desired_count == 0 {
        return Vec::new();
    }

    let sentences = split_sentences(text);
    let lens: Vec<usize> = sentences.iter().map(|s| char_len(s)).collect();
    let mut cursor = 0;
    let mut buckets: Vec<String> = Vec::with_capacity(desired_count);

    for _ in 0..desired_count - 1 {
        let mut bucket = String::new();
        let mut len = 0;

        while cursor < sentences.len() && len < config.min_chars {
            bucket.push_str(&sentences[cursor]);
            len += lens[cursor];
            cursor += 1;
        }

        while cursor < sentences.len()
            && len < config.target_chars
            && len + lens[cursor] <= config.max_chars
        {
            bucket.push_str(&sentences[cursor]);
            len += lens[cursor];
            cursor += 1;
        }

        buckets.push(bucket);
    }

    let mut last = String::new();
    while cursor < sentences.len() {
        last.push_str(&sentences[cursor]);
        cursor += 1;
    }
    buckets.push(last);

    redistribute_leftovers(&mut buckets, &sentences[cursor..], config);

    buckets
        .into_iter()
        .enumerate()
        .map(|(index, text)| Segment::new(index, text))
        .collect()
}

/// 将未消费的句子轮询回填到已有片段
///
/// 跳过加入后会超过 max + OVERFLOW_SLACK 的片段；
/// 若所有片段都已满，则追加到当前最短的片段。
pub fn redistribute_leftovers(
    buckets: &mut [String],
    leftovers: &[String],
    config: &SegmenterConfig,
) {
    if buckets.is_empty() || leftovers.is_empty() {
        return;
    }

    let capacity = config.max_chars + OVERFLOW_SLACK;
    let mut lens: Vec<usize> = buckets.iter().map(|b| char_len(b)).collect();
    let mut next = 0;

    for sentence in leftovers {
        let sentence_len = char_len(sentence);
        let slot = (0..buckets.len())
            .map(|offset| (next + offset) % buckets.len())
            .find(|&i| lens[i] + sentence_len <= capacity);

        let target = match slot {
            Some(i) => {
                next = (i + 1) % buckets.len();
                i
            }
            None => (0..buckets.len()).min_by_key(|&i| lens[i]).unwrap_or(0),
        };

        buckets[target].push_str(sentence);
        lens[target] += sentence_len;
    }
}
