use crate::expression::Condition;
use crate::schema::{DocField, FieldType, Schema};
use crate::slides::SlideDescriptor;

/// One slide per Section Break. Layout-only types that have no place on a
/// slide are dropped and slides left without a value field are pruned.
pub fn auto_slides(schema: &Schema, title: &str, prompt_for_name: bool) -> Vec<SlideDescriptor> {
    let mut fields: Vec<&DocField> = schema.fields.iter().collect();
    let name_field = DocField::new_name_field();
    if prompt_for_name {
        fields.insert(0, &name_field);
    }

    let mut slides = Vec::new();
    let mut current = SlideDescriptor::new("slide-0", title, Vec::new());
    for field in fields {
        if field.fieldtype == FieldType::SectionBreak {
            let next = section_descriptor(field, title);
            push_if_real(&mut slides, std::mem::replace(&mut current, next));
            continue;
        }
        if field.fieldtype.is_dropped_from_slides() {
            continue;
        }
        current.fields.push(field.clone());
    }
    push_if_real(&mut slides, current);
    slides
}

fn section_descriptor(section: &DocField, title: &str) -> SlideDescriptor {
    let slide_title = section
        .label
        .as_deref()
        .filter(|label| !label.trim().is_empty())
        .unwrap_or(title);
    let mut descriptor = SlideDescriptor::new(section.fieldname.as_str(), slide_title, Vec::new());
    descriptor.help = section.description.clone();
    // A section condition that does not parse leaves the slide visible.
    descriptor.condition = section
        .depends_on
        .as_deref()
        .and_then(|raw| Condition::parse(raw).ok());
    descriptor
}

fn push_if_real(slides: &mut Vec<SlideDescriptor>, slide: SlideDescriptor) {
    if slide.value_field_count() > 0 {
        slides.push(slide);
    }
}
