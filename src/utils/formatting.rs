use dicom::core::value::{PrimitiveValue, Value};
use dicom::core::{Tag, VR};

const MAX_VALUE_LEN: usize = 120;

pub fn value_to_string<I, P>(value: &Value<I, P>, vr: VR) -> String {
    let rendered = match value {
        Value::Primitive(primitive) => primitive_to_string(primitive, vr),
        Value::Sequence(sequence) => {
            let count = sequence.multiplicity() as usize;
            format!("Sequence ({})", plural(count, "item"))
        }
        Value::PixelSequence(sequence) => {
            let fragments = plural(sequence.fragments().len(), "fragment");
            match sequence.offset_table().len() {
                0 => format!("Encapsulated pixel data ({fragments})"),
                entries => format!(
                    "Encapsulated pixel data ({fragments}, offset table {})",
                    plural(entries, "entry")
                ),
            }
        }
    };

    truncate(rendered, MAX_VALUE_LEN)
}

pub fn format_tag(tag: Tag) -> String {
    format!("{:04X},{:04X}", tag.group(), tag.element())
}

pub fn frame_label(index: u32, count: u32) -> String {
    if count == 0 {
        "No frames".to_string()
    } else {
        format!("Frame {} / {count}", index + 1)
    }
}

fn primitive_to_string(value: &PrimitiveValue, vr: VR) -> String {
    match value {
        PrimitiveValue::Empty => "(empty)".to_string(),
        PrimitiveValue::Tags(tags) => tags
            .iter()
            .map(|tag| format_tag(*tag))
            .collect::<Vec<_>>()
            .join("\\"),
        _ if is_binary_vr(vr) => {
            format!("Binary data ({} bytes)", value.calculate_byte_len())
        }
        _ => value.to_str().into_owned(),
    }
}

fn plural(count: usize, noun: &str) -> String {
    match (count, noun) {
        (1, _) => format!("1 {noun}"),
        (_, "entry") => format!("{count} entries"),
        _ => format!("{count} {noun}s"),
    }
}

fn truncate(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}

fn is_binary_vr(vr: VR) -> bool {
    matches!(
        vr,
        VR::OB | VR::OD | VR::OF | VR::OL | VR::OV | VR::OW | VR::UN
    )
}
