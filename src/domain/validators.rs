//! Runtime shape predicates for untrusted CMS payloads.
//!
//! Every predicate is total: `null`, scalars and partially-shaped objects
//! return `false` instead of failing. Fields that are not part of the shape
//! are ignored.

use serde_json::{Map, Value};

use crate::domain::types::{CompanyType, SelectValue, SkillCategory, Technology, WorkCategory};

type Object = Map<String, Value>;

pub fn validate_media_asset(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };

    non_empty_string(object, "url")
        && positive_dimension(object, "width")
        && positive_dimension(object, "height")
}

pub fn validate_work(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };

    string(object, "id")
        && string(object, "title")
        && string(object, "url")
        && media(object, "eyecatch")
        && string(object, "introductionUrl")
        && single_select::<WorkCategory>(object, "category")
        && string(object, "duration")
        && multi_select::<Technology>(object, "technologies")
        && string(object, "details")
}

pub fn validate_experience(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };

    string(object, "id")
        && string(object, "companyName")
        && media(object, "companyLogo")
        && string(object, "jobTitle")
        && non_empty_string_list(object, "workExperiences")
        && string(object, "duration")
        && string(object, "url")
        && single_select::<CompanyType>(object, "companyType")
        && string(object, "details")
}

pub fn validate_skill(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };

    string(object, "id")
        && string(object, "name")
        && media(object, "icon")
        && single_select::<SkillCategory>(object, "category")
        && string(object, "yearsOfExperience")
        && string(object, "details")
}

pub fn validate_settings(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };

    optional(object, "id", Value::is_string)
        && optional(object, "mvImage", validate_media_asset)
        && optional(object, "favicon", validate_media_asset)
        && optional(object, "profileImage", validate_media_asset)
        && optional(object, "name", Value::is_string)
        && optional(object, "nameEn", Value::is_string)
        && optional(object, "introductionMessage", Value::is_string)
        && optional(object, "detailMessage", Value::is_string)
        && optional(object, "aboutContent", Value::is_string)
}

pub fn validate_about(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };

    optional(object, "id", Value::is_string)
        && optional(object, "title", Value::is_string)
        && optional(object, "content", Value::is_string)
        && optional(object, "mvImage", validate_media_asset)
}

fn string(object: &Object, key: &str) -> bool {
    object.get(key).is_some_and(Value::is_string)
}

fn non_empty_string(object: &Object, key: &str) -> bool {
    object
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|value| !value.is_empty())
}

fn positive_dimension(object: &Object, key: &str) -> bool {
    object
        .get(key)
        .and_then(Value::as_u64)
        .is_some_and(|value| value > 0 && value <= u64::from(u32::MAX))
}

fn media(object: &Object, key: &str) -> bool {
    object.get(key).is_some_and(validate_media_asset)
}

fn non_empty_string_list(object: &Object, key: &str) -> bool {
    match object.get(key) {
        Some(Value::Array(items)) => !items.is_empty() && items.iter().all(Value::is_string),
        _ => false,
    }
}

fn is_label<T: SelectValue>(value: &Value) -> bool {
    value.as_str().and_then(T::from_label).is_some()
}

fn single_select<T: SelectValue>(object: &Object, key: &str) -> bool {
    match object.get(key) {
        Some(Value::Array(items)) => items.len() == 1 && is_label::<T>(&items[0]),
        Some(value) => is_label::<T>(value),
        None => false,
    }
}

fn multi_select<T: SelectValue>(object: &Object, key: &str) -> bool {
    match object.get(key) {
        Some(Value::Array(items)) => !items.is_empty() && items.iter().all(is_label::<T>),
        _ => false,
    }
}

fn optional(object: &Object, key: &str, check: impl Fn(&Value) -> bool) -> bool {
    match object.get(key) {
        None | Some(Value::Null) => true,
        Some(value) => check(value),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn image() -> Value {
        json!({"url": "https://images.example.com/a.png", "width": 800, "height": 600})
    }

    fn work() -> Value {
        json!({
            "id": "w1",
            "title": "Recruiting site",
            "url": "https://example.com",
            "eyecatch": image(),
            "introductionUrl": "https://example.com/works/w1",
            "category": "Webシステム構築",
            "duration": "3 months",
            "technologies": ["Next.js", "TypeScript"],
            "details": "<p>details</p>",
            "createdAt": "2024-01-01T00:00:00.000Z"
        })
    }

    fn experience() -> Value {
        json!({
            "id": "c1",
            "companyName": "Example Inc.",
            "companyLogo": image(),
            "jobTitle": "Front-end engineer",
            "workExperiences": ["Coding", "Direction"],
            "duration": "2019-2022",
            "url": "https://example.co.jp",
            "companyType": ["事業会社"],
            "details": ""
        })
    }

    fn skill() -> Value {
        json!({
            "id": "s1",
            "name": "Rust",
            "icon": image(),
            "category": "言語",
            "yearsOfExperience": "3年",
            "details": "<p>systems</p>"
        })
    }

    fn without(mut value: Value, key: &str) -> Value {
        value.as_object_mut().expect("object").remove(key);
        value
    }

    fn with(mut value: Value, key: &str, field: Value) -> Value {
        value
            .as_object_mut()
            .expect("object")
            .insert(key.to_string(), field);
        value
    }

    #[test]
    fn well_formed_payloads_validate() {
        assert!(validate_media_asset(&image()));
        assert!(validate_work(&work()));
        assert!(validate_experience(&experience()));
        assert!(validate_skill(&skill()));
        assert!(validate_settings(&json!({})));
        assert!(validate_about(&json!({"content": "<p>hi</p>"})));
    }

    #[test]
    fn non_objects_are_rejected() {
        for value in [
            Value::Null,
            json!(1),
            json!("work"),
            json!([work()]),
            json!(true),
        ] {
            assert!(!validate_media_asset(&value));
            assert!(!validate_work(&value));
            assert!(!validate_experience(&value));
            assert!(!validate_skill(&value));
            assert!(!validate_settings(&value));
            assert!(!validate_about(&value));
        }
    }

    #[test]
    fn every_required_work_field_is_enforced() {
        for key in [
            "id",
            "title",
            "url",
            "eyecatch",
            "introductionUrl",
            "category",
            "duration",
            "technologies",
            "details",
        ] {
            assert!(!validate_work(&without(work(), key)), "missing `{key}`");
        }
    }

    #[test]
    fn every_required_experience_field_is_enforced() {
        for key in [
            "id",
            "companyName",
            "companyLogo",
            "jobTitle",
            "workExperiences",
            "duration",
            "url",
            "companyType",
            "details",
        ] {
            assert!(
                !validate_experience(&without(experience(), key)),
                "missing `{key}`"
            );
        }
    }

    #[test]
    fn every_required_skill_field_is_enforced() {
        for key in [
            "id",
            "name",
            "icon",
            "category",
            "yearsOfExperience",
            "details",
        ] {
            assert!(!validate_skill(&without(skill(), key)), "missing `{key}`");
        }
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(!validate_work(&with(work(), "title", json!(42))));
        assert!(!validate_work(&with(work(), "technologies", json!("Next.js"))));
        assert!(!validate_experience(&with(
            experience(),
            "workExperiences",
            json!(["ok", 3])
        )));
        assert!(!validate_skill(&with(skill(), "yearsOfExperience", json!(3))));
        assert!(!validate_settings(&json!({"name": 7})));
        assert!(!validate_about(&json!({"content": ["x"]})));
    }

    #[test]
    fn enum_values_outside_the_set_are_rejected() {
        assert!(!validate_work(&with(work(), "category", json!("ゲーム開発"))));
        assert!(!validate_work(&with(
            work(),
            "technologies",
            json!(["Next.js", "Elm"])
        )));
        assert!(!validate_experience(&with(
            experience(),
            "companyType",
            json!("Agency")
        )));
        assert!(!validate_skill(&with(skill(), "category", json!(["言語", "OS"]))));
    }

    #[test]
    fn empty_required_lists_are_rejected() {
        assert!(!validate_work(&with(work(), "technologies", json!([]))));
        assert!(!validate_experience(&with(
            experience(),
            "workExperiences",
            json!([])
        )));
    }

    #[test]
    fn media_asset_dimensions_must_be_positive_integers() {
        let base = image();
        assert!(!validate_media_asset(&with(base.clone(), "width", json!(0))));
        assert!(!validate_media_asset(&with(base.clone(), "height", json!(-1))));
        assert!(!validate_media_asset(&with(base.clone(), "width", json!(12.5))));
        assert!(!validate_media_asset(&with(base.clone(), "width", json!("800"))));
        assert!(!validate_media_asset(&with(base, "url", json!(""))));
    }

    #[test]
    fn settings_validate_present_optional_fields() {
        assert!(validate_settings(&json!({
            "name": "Taro",
            "nameEn": "Taro Yamada",
            "mvImage": image(),
            "profileImage": null
        })));
        assert!(!validate_settings(&json!({"favicon": {"url": "x"}})));
    }
}
