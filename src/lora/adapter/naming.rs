//! PEFT tensor naming convention
//!
//! PEFT stores factors as `base_model.model.{module}.lora_A.weight` and
//! `...lora_B.weight` (older releases insert the adapter name, e.g.
//! `lora_A.default.weight`). The merge target is `{module}.weight`.

const PEFT_PREFIX: &str = "base_model.model.";

/// Which factor of the pair a tensor holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoraFactor {
    /// `lora_A`, shape `[r, in]`
    Down,
    /// `lora_B`, shape `[out, r]`
    Up,
}

/// A parsed PEFT factor tensor name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeftTensorName {
    /// Base tensor the factor applies to
    pub target: String,
    /// Factor kind
    pub factor: LoraFactor,
}

/// Parse a PEFT factor tensor name
///
/// Returns `None` for tensors that are not linear-layer LoRA factors
/// (embedding factors, `modules_to_save` copies, etc.).
#[must_use]
pub fn parse_peft_tensor_name(name: &str) -> Option<PeftTensorName> {
    let path = name.strip_prefix(PEFT_PREFIX).unwrap_or(name);

    for (marker, factor) in [(".lora_A.", LoraFactor::Down), (".lora_B.", LoraFactor::Up)] {
        let Some(pos) = path.rfind(marker) else {
            continue;
        };
        let module = &path[..pos];
        let rest = &path[pos + marker.len()..];
        let valid_suffix = rest == "weight"
            || rest
                .strip_suffix(".weight")
                .is_some_and(|adapter_name| !adapter_name.is_empty() && !adapter_name.contains('.'));
        if module.is_empty() || !valid_suffix {
            return None;
        }
        return Some(PeftTensorName { target: format!("{module}.weight"), factor });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lora_a() {
        let parsed =
            parse_peft_tensor_name("base_model.model.model.layers.0.self_attn.q_proj.lora_A.weight")
                .unwrap();
        assert_eq!(parsed.target, "model.layers.0.self_attn.q_proj.weight");
        assert_eq!(parsed.factor, LoraFactor::Down);
    }

    #[test]
    fn test_parse_lora_b_with_adapter_name() {
        let parsed =
            parse_peft_tensor_name("base_model.model.model.layers.3.mlp.up_proj.lora_B.default.weight")
                .unwrap();
        assert_eq!(parsed.target, "model.layers.3.mlp.up_proj.weight");
        assert_eq!(parsed.factor, LoraFactor::Up);
    }

    #[test]
    fn test_parse_without_prefix() {
        let parsed = parse_peft_tensor_name("lm_head.lora_B.weight").unwrap();
        assert_eq!(parsed.target, "lm_head.weight");
    }

    #[test]
    fn test_embedding_factors_not_parsed() {
        assert!(parse_peft_tensor_name("base_model.model.model.embed_tokens.lora_embedding_A")
            .is_none());
    }

    #[test]
    fn test_modules_to_save_not_parsed() {
        assert!(
            parse_peft_tensor_name("base_model.model.score.modules_to_save.default.weight").is_none()
        );
    }

    #[test]
    fn test_bias_suffix_not_parsed() {
        assert!(parse_peft_tensor_name("base_model.model.q_proj.lora_A.bias").is_none());
    }
}
