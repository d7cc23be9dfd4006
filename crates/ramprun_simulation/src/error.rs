//! Ошибки симуляции (fail fast на этапе построения уровня / загрузки конфига)
//!
//! Per-tick ошибок нет. No-hit это `None`, провал сквозь геометрию ловит safety clamp.

/// Ошибка регистрации collision shape
///
/// Вырожденная геометрия, возвращается из `GeometryRegistry::add_shape`
/// отклоняется сразу, а не молча пропускается во время raycast.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("Box dimensions must be positive and finite, got {width} x {height} x {depth}")]
    DegenerateBox { width: f32, height: f32, depth: f32 },

    #[error("Plane normal must be non-zero and finite, got {0:?}")]
    DegeneratePlaneNormal([f32; 3]),

    #[error("Non-finite shape transform ({0})")]
    NonFiniteTransform(&'static str),
}

/// Ошибка конфигурации
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
