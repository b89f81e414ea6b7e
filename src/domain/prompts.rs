//! 生成服务的指令文本与结果解析
//!
//! 生成服务只返回一段不透明的文本，这里只信任显式校验过的结构：
//! - 分段结果按 "[1]"、"【2】" 这类序号标记提取
//! - 场景标题按 "[SCENE n: 标题]" 头部提取

use std::sync::LazyLock;

use regex::Regex;

use super::narration::NarrationConfig;
use super::script::{ChapterText, NarrationUnit, Segment, ShotType};
use super::text_segmenter::SegmenterConfig;

/// 片段序号标记：[1]、【2】、[片段3]、[Segment 4]
static ORDINAL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\[【]\s*(?:片段|段落|(?i:segment)\s*)?(\d+)\s*[\]】]").expect("valid regex")
});

/// 场景头部：[SCENE 3: 标题]、【场景3：标题】
static SCENE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\[【]\s*(?:(?i:scene)|场景)\s*(\d+)\s*[:：]\s*([^\]】\n]+?)\s*[\]】]")
        .expect("valid regex")
});

/// 分段指令
pub fn segmentation_prompt(chapter_text: &str, count: usize, config: &SegmenterConfig) -> String {
    format!(
        "请把下面的小说章节切分为恰好 {count} 个连续片段。\n\
         要求：\n\
         1. 片段按原文顺序排列，首尾相接，不得遗漏、改写或重复原文；\n\
         2. 每个片段 {min}~{max} 个字，语义完整，优先在场景或动作转换处切分；\n\
         3. 每个片段单独一行，以序号标记开头，格式为：[1] 片段内容；\n\
         4. 除片段外不要输出任何说明。\n\n\
         章节原文：\n{chapter_text}",
        count = count,
        min = config.min_chars,
        max = config.max_chars,
        chapter_text = chapter_text,
    )
}

/// 旁白指令：一次调用覆盖全部片段
pub fn narration_prompt(segments: &[Segment], config: &NarrationConfig) -> String {
    let count = segments.len();
    let listing = segments
        .iter()
        .map(|s| format!("[{}] {}", s.index + 1, s.text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "下面是同一章节按顺序排列的 {count} 个片段。请写一段连续的旁白，\
         按顺序概括每个片段的核心动作，每个片段对应约 {min}~{max} 个字。\n\
         要求：\n\
         1. 旁白总字数在 {min_total}~{max_total} 字之间；\n\
         2. 相邻内容中不要重复人名，尽量使用代词；\n\
         3. 不要使用句号、问号、感叹号、省略号，可以使用逗号；\n\
         4. 不要输出字数标注、序号或任何说明，只输出旁白正文。\n\n\
         片段：\n{listing}",
        count = count,
        min = config.min_chars,
        max = config.max_chars,
        min_total = config.min_total(count),
        max_total = config.max_total(count),
        listing = listing,
    )
}

/// 单场景指令
pub fn scene_prompt(chapter: &ChapterText, segment: &Segment, narration: &NarrationUnit) -> String {
    let number = segment.index + 1;
    format!(
        "你是分镜编剧。根据第 {chapter_number} 章《{chapter_title}》中的一个片段，写出恰好一个场景。\n\
         输出格式：\n\
         第一行为场景头部：[SCENE {number}: 场景标题]\n\
         第二行为唯一的一条镜头描述，以镜头类型开头（Wide shot / Medium shot / Close-up），\
         只描述该片段中的内容。\n\
         不要输出其他场景或任何说明。\n\n\
         片段原文：{text}\n\
         旁白：{narration}",
        chapter_number = chapter.number,
        chapter_title = chapter.title,
        number = number,
        text = segment.text,
        narration = narration.text,
    )
}

/// 按序号标记提取片段，返回按出现顺序排列的内容（已去除首尾空白）
pub fn extract_numbered_pieces(response: &str) -> Vec<String> {
    let markers: Vec<(usize, usize)> = ORDINAL_MARKER
        .find_iter(response)
        .map(|m| (m.start(), m.end()))
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, &(_, end))| {
            let stop = markers
                .get(i + 1)
                .map(|&(start, _)| start)
                .unwrap_or(response.len());
            response[end..stop].trim().to_string()
        })
        .collect()
}

/// 从场景头部提取标题
pub fn extract_scene_title(body: &str) -> Option<String> {
    SCENE_HEADER
        .captures(body)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
}

/// 识别镜头类型（取第一条以镜头标签开头的行）
pub fn detect_shot_type(body: &str) -> Option<ShotType> {
    body.lines()
        .map(|line| {
            line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '*' | '•'))
                .to_lowercase()
        })
        .find_map(|line| {
            if line.starts_with("wide") || line.starts_with("远景") || line.starts_with("全景") {
                Some(ShotType::Wide)
            } else if line.starts_with("medium") || line.starts_with("中景") {
                Some(ShotType::Medium)
            } else if line.starts_with("close-up")
                || line.starts_with("close up")
                || line.starts_with("closeup")
                || line.starts_with("特写")
                || line.starts_with("近景")
            {
                Some(ShotType::CloseUp)
            } else {
                None
            }
        })
}
