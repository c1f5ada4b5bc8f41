use serde::{Deserialize, Serialize};

/// 一次模型调用的token用量
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

impl TokenUsage {
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }

    /// 按模型档位粗略估算费用（美元）
    pub fn estimate_cost(&self, model_name: &str) -> f64 {
        // 每千token的输入/输出单价
        let (input_price, output_price) = if model_name.contains("mini") || model_name.is_empty() {
            (0.00015, 0.0006)
        } else {
            (0.0025, 0.01)
        };
        self.input_tokens as f64 / 1000.0 * input_price
            + self.output_tokens as f64 / 1000.0 * output_price
    }
}
