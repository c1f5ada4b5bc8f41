//! 最终报告的拼装

const INSIGHTS_HEADER: &str = "## Insights";
const SOURCES_DELIMITER: &str = "\n## Sources\n";
const PART_SEPARATOR: &str = "\n\n---\n\n";

/// 在第一个来源标题处切分正文，没有来源标题时原样返回
pub fn split_sources(content: &str) -> (&str, Option<&str>) {
    match content.split_once(SOURCES_DELIMITER) {
        Some((body, sources)) => (body, Some(sources)),
        None => (content, None),
    }
}

/// 拼装引言、正文、结论与来源
pub fn finalize_report(introduction: &str, content: &str, conclusion: &str) -> String {
    let content = content.strip_prefix(INSIGHTS_HEADER).unwrap_or(content);
    let (body, sources) = split_sources(content);

    let mut report = format!(
        "{}{}{}{}{}",
        introduction, PART_SEPARATOR, body, PART_SEPARATOR, conclusion
    );
    if let Some(sources) = sources {
        report.push_str("\n\n## Sources\n");
        report.push_str(sources);
    }
    report
}
