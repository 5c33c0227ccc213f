pub mod formatter;
pub mod types;
pub mod validator;

pub use types::{EncodedPayload, PayloadFields, PayloadType, ValidationPolicy};

use crate::config::LimitsConfig;
use crate::error::ValidationError;

/// 校验并格式化：管线的入口操作。
///
/// 先按策略校验，再产出规范载荷字符串；策略是显式参数，
/// 交互预览用 `Lenient`，服务端 API 与批量路径用 `Strict`。
pub fn validate_and_format(
    ty: PayloadType,
    fields: &PayloadFields,
    policy: ValidationPolicy,
    limits: &LimitsConfig,
) -> Result<EncodedPayload, ValidationError> {
    validator::validate(ty, fields, policy, limits)?;
    Ok(formatter::format(ty, fields, policy))
}
