use crate::{
    config::LLMConfig, llm::client::types::TokenUsage, utils::token_estimator::TokenEstimator,
};

use std::sync::LazyLock;

static TOKEN_ESTIMATOR: LazyLock<TokenEstimator> = LazyLock::new(TokenEstimator::new);

/// 短上下文使用efficient模型并以powerful模型兜底，长上下文直接使用powerful模型
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> (String, Option<String>) {
    if system_prompt.len() + user_prompt.len() <= 32 * 1024 {
        let fallback = (llm_config.model_powerful != llm_config.model_efficient)
            .then(|| llm_config.model_powerful.clone());
        return (llm_config.model_efficient.clone(), fallback);
    }
    (llm_config.model_powerful.clone(), None)
}

/// 估算token使用情况（基于文本长度）
pub fn estimate_token_usage(input_text: &str, output_text: &str) -> TokenUsage {
    TokenUsage::new(
        TOKEN_ESTIMATOR.estimate_tokens(input_text),
        TOKEN_ESTIMATOR.estimate_tokens(output_text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_prompt_uses_efficient_model_with_fallback() {
        let config = LLMConfig::default();
        let (model, fallback) = evaluate_befitting_model(&config, "system", "user");
        assert_eq!(model, config.model_efficient);
        assert_eq!(fallback, Some(config.model_powerful.clone()));
    }

    #[test]
    fn test_long_prompt_uses_powerful_model() {
        let config = LLMConfig::default();
        let long = "x".repeat(40 * 1024);
        let (model, fallback) = evaluate_befitting_model(&config, "system", &long);
        assert_eq!(model, config.model_powerful);
        assert!(fallback.is_none());
    }

    #[test]
    fn test_same_models_have_no_fallback() {
        let config = LLMConfig {
            model_powerful: "gpt-4o-mini".to_string(),
            model_efficient: "gpt-4o-mini".to_string(),
            ..Default::default()
        };
        let (_, fallback) = evaluate_befitting_model(&config, "a", "b");
        assert!(fallback.is_none());
    }

    #[test]
    fn test_estimate_token_usage_totals() {
        let usage = estimate_token_usage("hello world", "ok");
        assert_eq!(usage.total_tokens, usage.input_tokens + usage.output_tokens);
        assert!(usage.input_tokens > usage.output_tokens);
    }
}
