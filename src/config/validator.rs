use crate::config::Config;
use crate::error::{CivicError, Result, ValidationError};
use regex::Regex;

/// Upper bound for `search.max_offset`
const MAX_OFFSET_CEILING: usize = 100_000;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        // Validate schema version
        Self::validate_schema_version(config, &mut errors);

        // Validate request limits and deadlines
        Self::validate_search(config, &mut errors);

        // Validate normalizer tables
        Self::validate_query(config, &mut errors);

        // Validate strategy settings
        Self::validate_strategies(config, &mut errors);

        // Validate fusion weights
        Self::validate_fusion(config, &mut errors);

        // Validate synthesis caps
        Self::validate_synthesis(config, &mut errors);

        // Validate embedding settings
        Self::validate_embedding(config, &mut errors);

        // Validate LLM settings
        Self::validate_llm(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CivicError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_search(config: &Config, errors: &mut Vec<ValidationError>) {
        let search = &config.search;

        if search.default_limit == 0 {
            errors.push(ValidationError::new(
                "search.default_limit",
                "Default limit must be greater than 0",
            ));
        }

        if search.default_limit > search.max_limit {
            errors.push(ValidationError::new(
                "search.default_limit",
                format!(
                    "Default limit {} exceeds max limit {}",
                    search.default_limit, search.max_limit
                ),
            ));
        }

        if search.max_offset > MAX_OFFSET_CEILING {
            errors.push(ValidationError::new(
                "search.max_offset",
                format!(
                    "Max offset {} exceeds {}",
                    search.max_offset, MAX_OFFSET_CEILING
                ),
            ));
        }

        if search.search_multiplier == 0 {
            errors.push(ValidationError::new(
                "search.search_multiplier",
                "Search multiplier must be greater than 0",
            ));
        }

        if search.strategy_timeout_ms == 0 || search.query_deadline_ms == 0 {
            errors.push(ValidationError::new(
                "search",
                "Timeouts must be greater than 0",
            ));
        }
    }

    fn validate_query(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.query.max_length == 0 {
            errors.push(ValidationError::new(
                "query.max_length",
                "Maximum query length must be greater than 0",
            ));
        }

        if config.query.min_terms_after_stopwords == 0 {
            errors.push(ValidationError::new(
                "query.min_terms_after_stopwords",
                "At least one term must survive stop-word removal",
            ));
        }

        for (i, rule) in config.query.identifier_rules.iter().enumerate() {
            let path = format!("query.identifier_rules[{}]", i);
            if rule.prefix.is_empty() {
                errors.push(ValidationError::new(&path, "Prefix cannot be empty"));
            }
            match Regex::new(&rule.pattern) {
                Ok(re) if re.captures_len() < 2 => {
                    errors.push(ValidationError::new(
                        &path,
                        "Pattern must capture the identifier number",
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    errors.push(ValidationError::new(&path, format!("Invalid pattern: {}", e)));
                }
            }
        }
    }

    fn validate_strategies(config: &Config, errors: &mut Vec<ValidationError>) {
        if !(config.keyword.phrase_boost >= 1.0 && config.keyword.phrase_boost.is_finite()) {
            errors.push(ValidationError::new(
                "keyword.phrase_boost",
                format!(
                    "Phrase boost must be at least 1.0, got {}",
                    config.keyword.phrase_boost
                ),
            ));
        }

        let boosts = [
            ("keyword.title_boost", config.keyword.title_boost),
            ("keyword.summary_boost", config.keyword.summary_boost),
            ("keyword.body_boost", config.keyword.body_boost),
        ];
        for (path, boost) in boosts {
            if !(boost > 0.0 && boost.is_finite()) {
                errors.push(ValidationError::new(path, "Field boost must be positive"));
            }
        }

        let min_similarity = config.semantic.min_similarity;
        if !(-1.0..=1.0).contains(&min_similarity) {
            errors.push(ValidationError::new(
                "semantic.min_similarity",
                format!(
                    "Similarity floor must be between -1.0 and 1.0, got {}",
                    min_similarity
                ),
            ));
        }

        // Validate HNSW parameters
        if config.semantic.hnsw_m == 0 {
            errors.push(ValidationError::new(
                "semantic.hnsw_m",
                "HNSW M must be greater than 0",
            ));
        }

        if config.semantic.hnsw_ef_construction == 0 || config.semantic.hnsw_ef_search == 0 {
            errors.push(ValidationError::new(
                "semantic",
                "HNSW ef parameters must be greater than 0",
            ));
        }

        if config.semantic.candidate_pool == 0 {
            errors.push(ValidationError::new(
                "semantic.candidate_pool",
                "Candidate pool must be greater than 0",
            ));
        }
    }

    fn validate_fusion(config: &Config, errors: &mut Vec<ValidationError>) {
        let fusion = &config.fusion;

        if !(fusion.rrf_k > 0.0 && fusion.rrf_k.is_finite()) {
            errors.push(ValidationError::new(
                "fusion.rrf_k",
                format!("RRF constant must be positive, got {}", fusion.rrf_k),
            ));
        }

        let weights = [
            ("fusion.keyword_weight", fusion.keyword_weight),
            ("fusion.semantic_weight", fusion.semantic_weight),
            ("fusion.metadata_weight", fusion.metadata_weight),
        ];
        for (path, weight) in weights {
            if !(weight > 0.0 && weight.is_finite()) {
                errors.push(ValidationError::new(
                    path,
                    format!("Weight must be positive, got {}", weight),
                ));
            }
        }
    }

    fn validate_synthesis(config: &Config, errors: &mut Vec<ValidationError>) {
        let synthesis = &config.synthesis;

        let caps = [
            ("synthesis.sparse_result_cap", synthesis.sparse_result_cap),
            ("synthesis.fallback_ceiling", synthesis.fallback_ceiling),
        ];
        for (path, cap) in caps {
            if !(cap > 0.0 && cap <= 1.0) {
                errors.push(ValidationError::new(
                    path,
                    format!("Confidence cap must be in (0.0, 1.0], got {}", cap),
                ));
            }
        }

        if synthesis.context_documents == 0 {
            errors.push(ValidationError::new(
                "synthesis.context_documents",
                "Context must hold at least one document",
            ));
        }

        if synthesis.max_suggestions > 5 {
            errors.push(ValidationError::new(
                "synthesis.max_suggestions",
                "At most 5 suggestions are returned",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.embedding.dimension == 0 {
            errors.push(ValidationError::new(
                "embedding.dimension",
                "Vector dimension must be greater than 0",
            ));
        }

        // Validate model name is not empty
        if config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }
    }

    fn validate_llm(config: &Config, errors: &mut Vec<ValidationError>) {
        // Validate temperature range
        let temp = config.llm.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "llm.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }

        // Validate provider
        let provider = &config.llm.provider;
        let valid_providers = ["anthropic", "openai"];
        if !valid_providers.contains(&provider.as_str()) {
            errors.push(ValidationError::new(
                "llm.provider",
                format!(
                    "Provider must be one of {:?}, got '{}'",
                    valid_providers, provider
                ),
            ));
        }

        if config.llm.timeout_ms == 0 {
            errors.push(ValidationError::new(
                "llm.timeout_ms",
                "Generation timeout must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentifierRuleConfig;

    fn error_paths(config: &Config) -> Vec<String> {
        match ConfigValidator::validate(config) {
            Err(CivicError::ConfigValidation { errors }) => {
                errors.into_iter().map(|e| e.path).collect()
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_zero_weight_rejected() {
        let mut config = Config::default();
        config.fusion.semantic_weight = 0.0;
        assert_eq!(error_paths(&config), vec!["fusion.semantic_weight"]);
    }

    #[test]
    fn test_collects_every_violation() {
        let mut config = Config::default();
        config.fusion.rrf_k = -1.0;
        config.synthesis.fallback_ceiling = 1.5;
        config.llm.provider = "invalid".to_string();
        let paths = error_paths(&config);
        assert!(paths.contains(&"fusion.rrf_k".to_string()));
        assert!(paths.contains(&"synthesis.fallback_ceiling".to_string()));
        assert!(paths.contains(&"llm.provider".to_string()));
    }

    #[test]
    fn test_identifier_rule_must_compile_and_capture() {
        let mut config = Config::default();
        config.query.identifier_rules = vec![
            IdentifierRuleConfig::new("HR", "(unclosed"),
            IdentifierRuleConfig::new("S", "senate"),
        ];
        let paths = error_paths(&config);
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn test_missing_api_key_is_not_a_validation_error() {
        let mut config = Config::default();
        config.llm.enabled = true;
        config.llm.api_key_env = "CIVICLENS_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());
    }
}
