/// Token估算器，在模型未返回用量时粗略估算文本的token数量
pub struct TokenEstimator {
    rules: TokenCalculationRules,
}

/// Token计算规则
#[derive(Debug, Clone)]
pub struct TokenCalculationRules {
    /// 英文字符的平均token比例（字符数/token数）
    pub english_char_per_token: f64,
    /// 中日韩字符的平均token比例
    pub cjk_char_per_token: f64,
    /// 基础token开销（消息包装等）
    pub base_token_overhead: usize,
}

impl Default for TokenCalculationRules {
    fn default() -> Self {
        Self {
            english_char_per_token: 4.0,
            cjk_char_per_token: 1.5,
            base_token_overhead: 8,
        }
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenEstimator {
    pub fn new() -> Self {
        Self {
            rules: TokenCalculationRules::default(),
        }
    }

    pub fn with_rules(rules: TokenCalculationRules) -> Self {
        Self { rules }
    }

    /// 估算文本的token数量，空文本为0
    pub fn estimate_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let total = text.chars().count();
        let cjk = text.chars().filter(|c| is_cjk_char(*c)).count();
        let others = total - cjk;

        let cjk_tokens = (cjk as f64 / self.rules.cjk_char_per_token).ceil() as usize;
        let other_tokens = (others as f64 / self.rules.english_char_per_token).ceil() as usize;
        cjk_tokens + other_tokens + self.rules.base_token_overhead
    }
}

fn is_cjk_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF |   // CJK统一汉字
        0x3400..=0x4DBF |   // 扩展A
        0x3040..=0x30FF |   // 日文假名
        0xAC00..=0xD7AF |   // 韩文音节
        0x20000..=0x2A6DF   // 扩展B
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_has_no_tokens() {
        assert_eq!(TokenEstimator::new().estimate_tokens(""), 0);
    }

    #[test]
    fn test_cjk_text_costs_more_per_char() {
        let estimator = TokenEstimator::with_rules(TokenCalculationRules {
            base_token_overhead: 0,
            ..Default::default()
        });
        assert_eq!(estimator.estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimator.estimate_tokens("研究报告"), 3);
    }
}
