// ============================================================
// ENTITY SCHEMAS
// ============================================================
// Alias tables for each importable entity. Headers are matched after
// normalize_header, so aliases only need one spelling per word form.

use super::schema::{EntitySchema, FieldSpec};
use crate::domain::entity::EntityKind;
use crate::domain::record::FieldKind;

static EMPLOYEE_FIELDS: [FieldSpec; 13] = [
    FieldSpec::new(
        "employee_id",
        FieldKind::Text,
        &[
            "employee id",
            "employee number",
            "emp id",
            "emp no",
            "الرقم الوظيفي",
            "رقم الموظف",
        ],
    ),
    FieldSpec::new(
        "full_name_ar",
        FieldKind::Text,
        &["arabic name", "name (ar)", "الاسم", "الاسم الكامل", "الاسم بالعربي", "الاسم بالعربية"],
    ),
    FieldSpec::new(
        "full_name_en",
        FieldKind::Text,
        &["english name", "name (en)", "full name", "name", "الاسم بالانجليزي", "الاسم بالإنجليزية"],
    ),
    FieldSpec::new(
        "job_title",
        FieldKind::Text,
        &["job title", "position", "title", "المسمى الوظيفي", "الوظيفة"],
    ),
    FieldSpec::new(
        "department",
        FieldKind::Text,
        &["dept", "القسم", "الإدارة", "الادارة"],
    ),
    FieldSpec::new(
        "phone_direct",
        FieldKind::Text,
        &["phone", "direct phone", "mobile", "الهاتف", "رقم الهاتف", "الجوال", "الهاتف المباشر"],
    ),
    FieldSpec::new(
        "email",
        FieldKind::Text,
        &["e-mail", "mail", "البريد الإلكتروني", "البريد الالكتروني", "الايميل"],
    ),
    FieldSpec::new("center", FieldKind::Text, &["centre", "branch", "المركز", "الفرع"]),
    FieldSpec::new(
        "national_id",
        FieldKind::Text,
        &["national id", "id number", "رقم الهوية", "الهوية", "السجل المدني"],
    ),
    FieldSpec::new("nationality", FieldKind::Text, &["الجنسية"]),
    FieldSpec::new("gender", FieldKind::Enum, &["sex", "الجنس", "النوع"]),
    FieldSpec::new(
        "date_of_birth",
        FieldKind::Date,
        &["date of birth", "birth date", "birthdate", "dob", "تاريخ الميلاد"],
    ),
    FieldSpec::new(
        "classification_id",
        FieldKind::Text,
        &["classification", "التصنيف", "رقم التصنيف"],
    ),
];

pub static EMPLOYEE_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Employee,
    fields: &EMPLOYEE_FIELDS,
    required: &["employee_id"],
    natural_key: "employee_id",
    conflict_key: Some("employee_id"),
};

static OFFICE_CONTACT_FIELDS: [FieldSpec; 5] = [
    FieldSpec::new(
        "name",
        FieldKind::Text,
        &["office", "office name", "contact", "الاسم", "اسم المكتب", "المكتب", "الجهة"],
    ),
    FieldSpec::new(
        "extension",
        FieldKind::Text,
        &["ext", "ext.", "extension number", "التحويلة", "التحويله", "رقم التحويلة"],
    ),
    FieldSpec::new("department", FieldKind::Text, &["dept", "القسم", "الإدارة", "الادارة"]),
    FieldSpec::new(
        "location",
        FieldKind::Text,
        &["floor", "building", "الموقع", "الدور", "المبنى"],
    ),
    FieldSpec::new(
        "phone_direct",
        FieldKind::Text,
        &["phone", "direct line", "الهاتف", "الهاتف المباشر", "الرقم المباشر"],
    ),
];

pub static OFFICE_CONTACT_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::OfficeContact,
    fields: &OFFICE_CONTACT_FIELDS,
    required: &["name", "extension"],
    natural_key: "name",
    conflict_key: Some("name"),
};

static TASK_FIELDS: [FieldSpec; 6] = [
    FieldSpec::new(
        "title",
        FieldKind::Text,
        &["task", "task title", "المهمة", "عنوان المهمة", "العنوان"],
    ),
    FieldSpec::new(
        "description",
        FieldKind::Text,
        &["details", "notes", "الوصف", "التفاصيل"],
    ),
    FieldSpec::new(
        "assigned_to",
        FieldKind::Text,
        &["assigned to", "assignee", "owner", "المسؤول", "المكلف", "مسند إلى"],
    ),
    FieldSpec::new("priority", FieldKind::Enum, &["الأولوية", "الاولوية"]),
    FieldSpec::new(
        "due_date",
        FieldKind::Date,
        &["due date", "deadline", "تاريخ الاستحقاق", "تاريخ التسليم", "الموعد النهائي"],
    ),
    FieldSpec::new(
        "completed",
        FieldKind::Bool,
        &["done", "is completed", "status", "منجز", "مكتملة", "الحالة"],
    ),
];

pub static TASK_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Task,
    fields: &TASK_FIELDS,
    required: &["title"],
    natural_key: "title",
    conflict_key: None,
};

static TRANSACTION_FIELDS: [FieldSpec; 8] = [
    FieldSpec::new(
        "transaction_number",
        FieldKind::Text,
        &[
            "transaction number",
            "transaction no",
            "reference",
            "ref",
            "رقم المعاملة",
            "رقم الصادر",
            "رقم الوارد",
        ],
    ),
    FieldSpec::new("subject", FieldKind::Text, &["title", "الموضوع", "عنوان المعاملة"]),
    FieldSpec::new(
        "date",
        FieldKind::Date,
        &["transaction date", "التاريخ", "تاريخ المعاملة"],
    ),
    FieldSpec::new(
        "sender",
        FieldKind::Text,
        &["from", "from department", "المرسل", "الجهة المرسلة", "من"],
    ),
    FieldSpec::new(
        "recipient",
        FieldKind::Text,
        &["to", "المستلم", "الجهة المستلمة", "إلى", "الى"],
    ),
    FieldSpec::new("status", FieldKind::Enum, &["الحالة"]),
    FieldSpec::new("notes", FieldKind::Text, &["remarks", "ملاحظات", "الملاحظات"]),
    FieldSpec::new("attachment_url", FieldKind::Text, &["attachment", "المرفق"]).internal(),
];

pub static TRANSACTION_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Transaction,
    fields: &TRANSACTION_FIELDS,
    required: &["transaction_number", "subject", "date"],
    natural_key: "transaction_number",
    conflict_key: Some("transaction_number"),
};

pub fn schema_for(kind: EntityKind) -> &'static EntitySchema {
    match kind {
        EntityKind::Employee => &EMPLOYEE_SCHEMA,
        EntityKind::OfficeContact => &OFFICE_CONTACT_SCHEMA,
        EntityKind::Task => &TASK_SCHEMA,
        EntityKind::Transaction => &TRANSACTION_SCHEMA,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::normalize_header;
    use std::collections::HashSet;

    #[test]
    fn test_aliases_are_unambiguous_within_each_schema() {
        for kind in EntityKind::ALL {
            let schema = schema_for(kind);
            let mut seen = HashSet::new();
            for field in schema.fields {
                for spelling in std::iter::once(&field.name).chain(field.aliases.iter()) {
                    assert!(
                        seen.insert(normalize_header(spelling)),
                        "{} header '{}' maps to more than one field",
                        kind,
                        spelling
                    );
                }
            }
        }
    }

    #[test]
    fn test_keys_reference_declared_fields() {
        for kind in EntityKind::ALL {
            let schema = schema_for(kind);
            assert_eq!(schema.kind, kind);
            assert!(schema.field(schema.natural_key).is_some());
            for required in schema.required {
                assert!(schema.field(required).is_some(), "{} lacks {}", kind, required);
            }
            if let Some(key) = schema.conflict_key {
                assert!(schema.field(key).is_some());
            }
        }
    }

    #[test]
    fn test_employee_arabic_headers() {
        assert_eq!(EMPLOYEE_SCHEMA.canonical_for("الرقم الوظيفي"), Some("employee_id"));
        assert_eq!(EMPLOYEE_SCHEMA.canonical_for("الاسم"), Some("full_name_ar"));
        assert_eq!(EMPLOYEE_SCHEMA.canonical_for("Date Of Birth"), Some("date_of_birth"));
    }

    #[test]
    fn test_attachment_is_internal() {
        assert!(!TRANSACTION_SCHEMA.field("attachment_url").unwrap().exported);
        assert!(TRANSACTION_SCHEMA
            .exported_fields()
            .all(|f| f.name != "attachment_url"));
    }
}
