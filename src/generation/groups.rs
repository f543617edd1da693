use super::GenerationError;
use crate::config::{FieldRef, GroupSpec, SlideGroupSpec};
use crate::expression::Condition;
use crate::schema::{DocField, Schema};
use crate::slides::SlideDescriptor;
use std::collections::BTreeSet;

/// Resolves field groups against the reference schema. Handed to
/// programmatic slide builders so they share the resolution rules.
#[derive(Debug, Clone, Copy)]
pub struct GroupToSlide<'a> {
    schema: Option<&'a Schema>,
}

impl<'a> GroupToSlide<'a> {
    pub fn new(schema: Option<&'a Schema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> Option<&'a Schema> {
        self.schema
    }

    pub fn resolve_field(&self, entry: usize, field: &FieldRef) -> Result<DocField, GenerationError> {
        match field {
            FieldRef::Field(field) => Ok(field.clone()),
            FieldRef::Name(fieldname) => {
                let schema = self.schema.ok_or_else(|| GenerationError::FieldWithoutSchema {
                    entry,
                    fieldname: fieldname.clone(),
                })?;
                schema
                    .field(fieldname)
                    .cloned()
                    .ok_or_else(|| GenerationError::UnknownField {
                        entry,
                        fieldname: fieldname.clone(),
                    })
            }
        }
    }

    pub fn group_to_slide(
        &self,
        index: usize,
        fields: &[FieldRef],
        title: &str,
    ) -> Result<SlideDescriptor, GenerationError> {
        if fields.is_empty() {
            return Err(GenerationError::EmptyGroup { entry: index });
        }
        let fields = fields
            .iter()
            .map(|field| self.resolve_field(index, field))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SlideDescriptor::new(format!("slide-{index}"), title, fields))
    }

    pub fn group_spec_to_slide(
        &self,
        index: usize,
        group: &GroupSpec,
        title: &str,
    ) -> Result<SlideDescriptor, GenerationError> {
        let mut descriptor = self.group_to_slide(
            index,
            &group.fields,
            group.title.as_deref().unwrap_or(title),
        )?;
        if let Some(name) = group.name.as_ref() {
            descriptor.name = name.clone();
        }
        descriptor.subtitle = group.subtitle.clone();
        descriptor.help = group.help.clone();
        descriptor.add_more = group.add_more;
        descriptor.max_count = group.max_count;
        if let Some(raw) = group.condition.as_deref() {
            let condition =
                Condition::parse(raw).map_err(|source| GenerationError::InvalidCondition {
                    entry: index,
                    expression: raw.to_string(),
                    source,
                })?;
            descriptor.condition = Some(condition);
        }
        Ok(descriptor)
    }

    fn section_to_slide(
        &self,
        index: usize,
        name: &str,
        title: &str,
    ) -> Result<SlideDescriptor, GenerationError> {
        let schema = self
            .schema
            .ok_or_else(|| GenerationError::SectionWithoutSchema {
                entry: index,
                name: name.to_string(),
            })?;
        let (section, members) =
            schema
                .section_fields(name)
                .ok_or_else(|| GenerationError::UnknownSection {
                    entry: index,
                    name: name.to_string(),
                })?;
        let fields = members
            .into_iter()
            .filter(|field| !field.fieldtype.is_dropped_from_slides())
            .cloned()
            .collect();
        let slide_title = section
            .label
            .as_deref()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or(title);
        let mut descriptor = SlideDescriptor::new(section.fieldname.as_str(), slide_title, fields);
        descriptor.help = section.description.clone();
        descriptor.condition = section
            .depends_on
            .as_deref()
            .and_then(|raw| Condition::parse(raw).ok());
        Ok(descriptor)
    }

    fn rest_to_slide(
        &self,
        index: usize,
        consumed: &BTreeSet<String>,
        title: &str,
    ) -> Result<SlideDescriptor, GenerationError> {
        let schema = self
            .schema
            .ok_or(GenerationError::RestWithoutSchema { entry: index })?;
        let fields = schema
            .fields
            .iter()
            .filter(|field| !field.fieldtype.is_layout())
            .filter(|field| !consumed.contains(field.fieldname.as_str()))
            .cloned()
            .collect();
        let mut descriptor = SlideDescriptor::new(format!("slide-{index}"), title, fields);
        descriptor.always_skip = true;
        Ok(descriptor)
    }
}

/// One descriptor per entry of a definition's `slides` list.
pub fn explicit_slides(
    groups: &[SlideGroupSpec],
    schema: Option<&Schema>,
    title: &str,
) -> Result<Vec<SlideDescriptor>, GenerationError> {
    let helper = GroupToSlide::new(schema);
    let mut consumed = BTreeSet::new();
    let mut slides = Vec::with_capacity(groups.len());
    for (index, group) in groups.iter().enumerate() {
        let descriptor = match group {
            SlideGroupSpec::Fields(fields) => helper.group_to_slide(index, fields, title)?,
            SlideGroupSpec::Group(group) => helper.group_spec_to_slide(index, group, title)?,
            SlideGroupSpec::Section(name) => helper.section_to_slide(index, name, title)?,
            SlideGroupSpec::Rest => {
                if index + 1 != groups.len() {
                    return Err(GenerationError::RestNotLast { entry: index });
                }
                let rest = helper.rest_to_slide(index, &consumed, title)?;
                if rest.fields.is_empty() {
                    continue;
                }
                rest
            }
            SlideGroupSpec::Builder(builder) => builder.build(index, &helper, title)?,
            SlideGroupSpec::Invalid(value) => {
                return Err(GenerationError::InvalidEntry {
                    entry: index,
                    value: value.to_string(),
                })
            }
        };
        consumed.extend(
            descriptor
                .fields
                .iter()
                .map(|field| field.fieldname.to_string()),
        );
        slides.push(descriptor);
    }
    Ok(slides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlideBuilder;
    use crate::schema::FieldType;
    use crate::shared::Fieldname;

    fn schema() -> Schema {
        serde_yaml::from_str(
            r#"
name: Customer
fields:
  - {fieldname: customer_name, fieldtype: Data, reqd: 1}
  - {fieldname: email, fieldtype: Data}
  - {fieldname: billing, fieldtype: Section Break, label: Billing Details}
  - {fieldname: tax_id, fieldtype: Data}
  - {fieldname: billing_tab, fieldtype: Tab Break}
  - {fieldname: currency, fieldtype: Link, options: Currency}
  - {fieldname: notes_section, fieldtype: Section Break}
  - {fieldname: notes, fieldtype: Text}
"#,
        )
        .expect("schema")
    }

    fn names(slide: &SlideDescriptor) -> Vec<&str> {
        slide
            .fields
            .iter()
            .map(|field| field.fieldname.as_str())
            .collect()
    }

    #[test]
    fn rest_collects_unconsumed_fields_and_is_always_skipped() {
        let groups = vec![
            SlideGroupSpec::fields(["customer_name"]),
            SlideGroupSpec::section("Billing Details"),
            SlideGroupSpec::Rest,
        ];
        let slides = explicit_slides(&groups, Some(&schema()), "Customer").expect("slides");
        assert_eq!(names(&slides[1]), vec!["tax_id", "currency"]);
        assert_eq!(slides[1].title, "Billing Details");
        assert_eq!(names(&slides[2]), vec!["email", "notes"]);
        assert!(slides[2].always_skip);
        assert!(!slides[0].always_skip);
    }

    #[test]
    fn unresolvable_names_fail_loudly() {
        let groups = vec![SlideGroupSpec::fields(["missing"])];
        let err = explicit_slides(&groups, Some(&schema()), "Customer").expect_err("missing");
        assert_eq!(
            err,
            GenerationError::UnknownField {
                entry: 0,
                fieldname: "missing".to_string()
            }
        );

        let groups = vec![SlideGroupSpec::section("shipping")];
        let err = explicit_slides(&groups, Some(&schema()), "Customer").expect_err("section");
        assert!(matches!(err, GenerationError::UnknownSection { .. }));
    }

    #[test]
    fn rest_requires_schema_and_last_position() {
        let err = explicit_slides(&[SlideGroupSpec::Rest], None, "Wizard").expect_err("no schema");
        assert_eq!(err, GenerationError::RestWithoutSchema { entry: 0 });

        let groups = vec![SlideGroupSpec::Rest, SlideGroupSpec::fields(["email"])];
        let err = explicit_slides(&groups, Some(&schema()), "Customer").expect_err("not last");
        assert_eq!(err, GenerationError::RestNotLast { entry: 0 });
    }

    #[test]
    fn inline_fields_work_without_schema() {
        let inline = DocField::new(Fieldname::parse("topic").expect("fieldname"), FieldType::Data);
        let groups = vec![SlideGroupSpec::fields([inline])];
        let slides = explicit_slides(&groups, None, "Survey").expect("slides");
        assert_eq!(names(&slides[0]), vec!["topic"]);
    }

    #[test]
    fn group_overrides_and_bad_conditions() {
        let group = GroupSpec {
            name: Some("contact".to_string()),
            title: Some("Contact".to_string()),
            fields: vec![FieldRef::from("email")],
            condition: Some("eval:doc.customer_name".to_string()),
            add_more: true,
            max_count: Some(3),
            ..GroupSpec::default()
        };
        let slides = explicit_slides(&[SlideGroupSpec::Group(group.clone())], Some(&schema()), "Customer")
            .expect("slides");
        assert_eq!(slides[0].name, "contact");
        assert_eq!(slides[0].title, "Contact");
        assert!(slides[0].add_more);
        assert_eq!(slides[0].max_count, Some(3));

        let broken = GroupSpec {
            condition: Some("eval:doc.a ==".to_string()),
            ..group
        };
        let err = explicit_slides(&[SlideGroupSpec::Group(broken)], Some(&schema()), "Customer")
            .expect_err("condition");
        assert!(matches!(err, GenerationError::InvalidCondition { entry: 0, .. }));
    }

    #[test]
    fn builders_receive_index_helper_and_title() {
        let groups = vec![
            SlideGroupSpec::fields(["customer_name"]),
            SlideGroupSpec::Builder(SlideBuilder::new(|index, helper, title| {
                let mut slide =
                    helper.group_to_slide(index, &[FieldRef::from("email")], &format!("{title} #{index}"))?;
                slide.subtitle = Some("built".to_string());
                Ok(slide)
            })),
        ];
        let slides = explicit_slides(&groups, Some(&schema()), "Customer").expect("slides");
        assert_eq!(slides[1].title, "Customer #1");
        assert_eq!(slides[1].subtitle.as_deref(), Some("built"));
    }

    #[test]
    fn invalid_entries_are_rejected() {
        let groups = vec![SlideGroupSpec::Invalid(serde_json::json!(42))];
        let err = explicit_slides(&groups, Some(&schema()), "Customer").expect_err("invalid");
        assert!(matches!(err, GenerationError::InvalidEntry { entry: 0, .. }));
    }
}
