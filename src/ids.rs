use uuid::Uuid;

/// Source of workflow identifiers for graphs the model did not label.
pub trait IdGenerator: Send + Sync {
    fn workflow_id(&self, prompt: &str) -> String;
}

/// Content-addressed ids: the same prompt always yields the same id.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptDigestIds;

impl IdGenerator for PromptDigestIds {
    fn workflow_id(&self, prompt: &str) -> String {
        let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, prompt.as_bytes());
        format!("AI-Generated-{:08}", digest.as_u128() % 100_000_000)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn workflow_id(&self, _prompt: &str) -> String {
        format!("AI-Generated-{}", Uuid::new_v4().simple())
    }
}
