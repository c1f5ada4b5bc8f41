use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;

/// 文件名中不允许出现的字符
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}_-]").expect("valid filename pattern"));

/// 由主题生成报告文件名：小写，空格替换为下划线，去掉其余非法字符
pub fn report_filename(topic: &str) -> String {
    let lowered = topic.trim().to_lowercase().replace(' ', "_");
    let slug = UNSAFE_FILENAME_CHARS.replace_all(&lowered, "");
    if slug.is_empty() {
        "research_report.md".to_string()
    } else {
        format!("research_report_{}.md", slug)
    }
}

pub trait Outlet {
    async fn save(&self, topic: &str, report: &str) -> Result<PathBuf>;
}

/// 把报告写入输出目录
pub struct DiskOutlet {
    output_dir: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, topic: &str, report: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("无法创建输出目录 {:?}", self.output_dir))?;

        let path = self.output_dir.join(report_filename(topic));
        fs::write(&path, report)
            .await
            .with_context(|| format!("写入报告失败 {:?}", path))?;

        println!("💾 已保存报告: {}", path.display());
        Ok(path)
    }
}
