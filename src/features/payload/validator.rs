use url::Url;

use crate::config::LimitsConfig;
use crate::error::ValidationError;

use super::types::{PayloadFields, PayloadType, ValidationPolicy};

/// 按类型校验原始字段。
///
/// 除 URL 外各类型的规则与策略无关；URL 的双策略语义：
/// - `Strict`：必须可解析为绝对 URI，否则返回 `InvalidUrl`
/// - `Lenient`：仅要求非空，缺少协议的输入交给格式化器补全
pub fn validate(
    ty: PayloadType,
    fields: &PayloadFields,
    policy: ValidationPolicy,
    limits: &LimitsConfig,
) -> Result<(), ValidationError> {
    match ty {
        PayloadType::Url => {
            let url = fields.url.as_deref().unwrap_or_default();
            if url.is_empty() {
                return Err(ValidationError::MissingField("url".to_string()));
            }
            if policy == ValidationPolicy::Strict && Url::parse(url).is_err() {
                return Err(ValidationError::InvalidUrl(url.to_string()));
            }
            Ok(())
        }
        PayloadType::Text => {
            let text = fields.text.as_deref().unwrap_or_default();
            if text.is_empty() {
                return Err(ValidationError::MissingField("text".to_string()));
            }
            if text.chars().count() > limits.max_text_chars {
                return Err(ValidationError::TooLong {
                    max: limits.max_text_chars,
                });
            }
            Ok(())
        }
        PayloadType::Email => {
            let email = fields.email.as_deref().unwrap_or_default();
            if email.is_empty() {
                return Err(ValidationError::MissingField("email".to_string()));
            }
            if !email.contains('@') {
                return Err(ValidationError::InvalidEmail);
            }
            Ok(())
        }
        PayloadType::Phone | PayloadType::Sms | PayloadType::Whatsapp => {
            if !PayloadFields::present(&fields.phone) {
                return Err(ValidationError::MissingPhone);
            }
            Ok(())
        }
        PayloadType::Wifi => {
            if !PayloadFields::present(&fields.ssid) {
                return Err(ValidationError::MissingSsid);
            }
            Ok(())
        }
        PayloadType::Vcard => {
            if !PayloadFields::present(&fields.first_name)
                && !PayloadFields::present(&fields.last_name)
            {
                return Err(ValidationError::MissingName);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> LimitsConfig {
        LimitsConfig::default()
    }

    #[test]
    fn strict_url_rejects_non_uri() {
        let fields = PayloadFields {
            url: Some("not a url".to_string()),
            ..Default::default()
        };
        let err = validate(PayloadType::Url, &fields, ValidationPolicy::Strict, &limits())
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidUrl(_)));
    }

    #[test]
    fn lenient_url_accepts_bare_domain() {
        let fields = PayloadFields {
            url: Some("example.com".to_string()),
            ..Default::default()
        };
        validate(PayloadType::Url, &fields, ValidationPolicy::Lenient, &limits())
            .expect("lenient policy accepts unprefixed input");
    }

    #[test]
    fn strict_url_accepts_absolute_uri() {
        let fields = PayloadFields {
            url: Some("https://example.com/path?q=1".to_string()),
            ..Default::default()
        };
        validate(PayloadType::Url, &fields, ValidationPolicy::Strict, &limits()).unwrap();
    }

    #[test]
    fn missing_url_is_reported_as_missing_field() {
        let err = validate(
            PayloadType::Url,
            &PayloadFields::default(),
            ValidationPolicy::Lenient,
            &limits(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("url".to_string()));
    }

    #[test]
    fn text_over_limit_fails_with_too_long() {
        let fields = PayloadFields {
            text: Some("a".repeat(2001)),
            ..Default::default()
        };
        let err = validate(PayloadType::Text, &fields, ValidationPolicy::Strict, &limits())
            .unwrap_err();
        assert_eq!(err, ValidationError::TooLong { max: 2000 });
    }

    #[test]
    fn text_limit_counts_characters_not_bytes() {
        // 2000 个多字节字符应通过（按字符计数）
        let fields = PayloadFields {
            text: Some("中".repeat(2000)),
            ..Default::default()
        };
        validate(PayloadType::Text, &fields, ValidationPolicy::Strict, &limits()).unwrap();
    }

    #[test]
    fn email_without_at_sign_is_invalid() {
        let fields = PayloadFields {
            email: Some("nobody.example.com".to_string()),
            ..Default::default()
        };
        let err = validate(PayloadType::Email, &fields, ValidationPolicy::Strict, &limits())
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidEmail);
    }

    #[test]
    fn phone_family_requires_phone() {
        for ty in [PayloadType::Phone, PayloadType::Sms, PayloadType::Whatsapp] {
            let err = validate(
                ty,
                &PayloadFields::default(),
                ValidationPolicy::Strict,
                &limits(),
            )
            .unwrap_err();
            assert_eq!(err, ValidationError::MissingPhone, "type: {ty}");
        }
    }

    #[test]
    fn wifi_requires_ssid() {
        let err = validate(
            PayloadType::Wifi,
            &PayloadFields::default(),
            ValidationPolicy::Strict,
            &limits(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingSsid);
    }

    #[test]
    fn vcard_accepts_either_name_part() {
        let first_only = PayloadFields {
            first_name: Some("Jane".to_string()),
            ..Default::default()
        };
        validate(PayloadType::Vcard, &first_only, ValidationPolicy::Strict, &limits()).unwrap();

        let last_only = PayloadFields {
            last_name: Some("Doe".to_string()),
            ..Default::default()
        };
        validate(PayloadType::Vcard, &last_only, ValidationPolicy::Strict, &limits()).unwrap();

        let err = validate(
            PayloadType::Vcard,
            &PayloadFields::default(),
            ValidationPolicy::Strict,
            &limits(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingName);
    }
}
