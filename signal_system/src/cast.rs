//! Value cast pipeline
//!
//! Stages run in registration order during hydration. The first stage to
//! claim a value supplies the field's final value; when no stage claims it
//! the caller falls back to the built-in coercion rules.

use crate::types::{CastStage, PostgresValue};
use type_mapping::FieldType;

/// A raw value about to be assigned to a declared field
#[derive(Debug, Clone, Copy)]
pub struct CastRequest<'a> {
    pub model: &'a str,
    pub field: &'a str,
    pub field_type: FieldType,
    pub value: &'a PostgresValue,
}

/// Result of a single cast stage
#[derive(Debug, Clone, PartialEq)]
pub enum CastOutcome {
    /// Leave the value to the next stage
    Pass,
    /// Use this value and stop
    Claim(PostgresValue),
}

pub struct CastPipeline {
    stages: std::sync::RwLock<Vec<CastStage>>,
}

impl std::fmt::Debug for CastPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastPipeline")
            .field("stage_count", &self.stage_count())
            .finish()
    }
}

impl CastPipeline {
    pub fn new() -> Self {
        Self {
            stages: std::sync::RwLock::new(Vec::new()),
        }
    }

    pub fn add_stage<F>(&self, stage: F)
    where
        F: Fn(&CastRequest<'_>) -> anyhow::Result<CastOutcome> + Send + Sync + 'static,
    {
        if let Ok(mut stages) = self.stages.write() {
            stages.push(Box::new(stage));
        }
    }

    /// Run the stages; `None` means no stage claimed the value
    pub fn cast(&self, request: &CastRequest<'_>) -> anyhow::Result<Option<PostgresValue>> {
        let stages = match self.stages.read() {
            Ok(stages) => stages,
            Err(_) => return Ok(None),
        };

        for stage in stages.iter() {
            if let CastOutcome::Claim(value) = stage(request)? {
                debug_log!(
                    "[CAST] {}.{} claimed as {}",
                    request.model,
                    request.field,
                    request.field_type
                );
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.read().map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for CastPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(value: &'a PostgresValue) -> CastRequest<'a> {
        CastRequest {
            model: "User",
            field: "forename",
            field_type: FieldType::String,
            value,
        }
    }

    #[test]
    fn test_no_stages_leaves_value_unclaimed() {
        let pipeline = CastPipeline::new();
        let value = PostgresValue::from("john");
        assert_eq!(pipeline.cast(&request(&value)).unwrap(), None);
    }

    #[test]
    fn test_first_claim_wins() {
        let pipeline = CastPipeline::new();
        pipeline.add_stage(|_| Ok(CastOutcome::Pass));
        pipeline.add_stage(|req| {
            let upper = req.value.as_str().unwrap_or_default().to_uppercase();
            Ok(CastOutcome::Claim(PostgresValue::Text(upper)))
        });
        pipeline.add_stage(|_| Ok(CastOutcome::Claim(PostgresValue::from("never"))));

        let value = PostgresValue::from("john");
        assert_eq!(
            pipeline.cast(&request(&value)).unwrap(),
            Some(PostgresValue::from("JOHN"))
        );
        assert_eq!(pipeline.stage_count(), 3);
    }

    #[test]
    fn test_stage_errors_propagate() {
        let pipeline = CastPipeline::new();
        pipeline.add_stage(|req| Err(anyhow::anyhow!("cannot cast {}", req.field)));

        let value = PostgresValue::Null;
        let err = pipeline.cast(&request(&value)).unwrap_err();
        assert_eq!(err.to_string(), "cannot cast forename");
    }
}
