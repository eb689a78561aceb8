//! 商品请求体校验
//!
//! 创建要求两个字段都存在，更新只检查出现的字段；两者共用同一套规则。

use serde_json::Value;
use validator::Validate;

use super::model::{CreateProductInput, UpdateProductInput};
use crate::core::validation::{body_object, collect_rule_errors, string_field, FieldErrors, Schema};

/// Declaration order; errors are reported in this order.
pub const PRODUCT_FIELDS: [&str; 2] = ["name", "description"];

#[derive(Debug, Default, Validate)]
struct ProductFields {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    name: Option<String>,
    #[validate(length(min = 1, message = "Description must not be empty"))]
    description: Option<String>,
}

/// Checks every product field independently and collects all failures.
/// `build` only sees fields whose values passed; its result is returned
/// when no error was recorded.
fn check_fields<T>(
    body: &Value,
    required: bool,
    build: impl FnOnce(ProductFields) -> T,
) -> Result<T, FieldErrors> {
    let object = body_object(body)?;
    let mut errors = FieldErrors::default();

    let fields = ProductFields {
        name: string_field(
            object,
            "name",
            required.then_some("Name is required"),
            &mut errors,
        ),
        description: string_field(
            object,
            "description",
            required.then_some("Description is required"),
            &mut errors,
        ),
    };
    collect_rule_errors(fields.validate(), &mut errors);

    errors.sort_by_schema(&PRODUCT_FIELDS);
    errors.into_result(build(fields))
}

impl Schema for CreateProductInput {
    fn validate_body(body: &Value) -> Result<Self, FieldErrors> {
        // an absent field has already been recorded as an error
        check_fields(body, true, |fields| CreateProductInput {
            name: fields.name.unwrap_or_default(),
            description: fields.description.unwrap_or_default(),
        })
    }
}

impl Schema for UpdateProductInput {
    fn validate_body(body: &Value) -> Result<Self, FieldErrors> {
        check_fields(body, false, |fields| UpdateProductInput {
            name: fields.name,
            description: fields.description,
        })
    }
}
