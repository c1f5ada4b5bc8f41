use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 分析师画像
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct Analyst {
    /// 分析师姓名
    pub name: String,
    /// 分析师在本次调研中的角色
    pub role: String,
    /// 所属机构
    pub affiliation: String,
    /// 关注点、顾虑与动机
    pub description: String,
}

impl Analyst {
    /// 用于提示词的画像文本
    pub fn persona(&self) -> String {
        format!(
            "Name: {}\nRole: {}\nAffiliation: {}\nDescription: {}\n",
            self.name, self.role, self.affiliation, self.description
        )
    }
}

/// 一组分析师，作为结构化提取的结果
#[derive(Debug, Serialize, Deserialize, Clone, Default, JsonSchema)]
pub struct Perspectives {
    /// 分析师列表，包含角色与所属机构
    #[serde(default)]
    pub analysts: Vec<Analyst>,
}

/// 检索查询
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct SearchQuery {
    /// 用于检索的查询语句
    pub search_query: String,
}
