use crate::message::Message;
use crate::model::DicomEntry;
use iced::widget::text::Wrapping;
use iced::widget::{button, column, row, text, Column};
use iced::{Alignment, Length};

pub fn instance_list<'a>(
    entries: &'a [DicomEntry],
    selected_instance: Option<usize>,
    compare_with: Option<usize>,
) -> Column<'a, Message> {
    let root = column![text("Imported Instances").size(20)].spacing(6);

    if entries.is_empty() {
        return root.push(text("No files imported"));
    }

    entries
        .iter()
        .enumerate()
        .fold(root, |column, (index, entry)| {
            let is_selected = selected_instance == Some(index);
            let is_pinned = compare_with == Some(index);

            let name = entry.view.file_name();
            let label = if is_selected { format!("▶ {name}") } else { name };
            let mut frames = match entry.view.frame_count {
                0 => "no pixel data".to_string(),
                1 => "1 frame".to_string(),
                count => format!("{count} frames"),
            };
            let size = entry.view.geometry.and_then(|geometry| geometry.size());
            if let Some((columns, rows)) = size {
                frames.push_str(&format!(", {columns}×{rows}"));
            }

            let select = button(
                column![
                    text(label).wrapping(Wrapping::Word),
                    text(format!("{} · {frames}", entry.patient_id)).size(12),
                    text(&entry.sop_instance_uid)
                        .size(11)
                        .wrapping(Wrapping::Glyph),
                ]
                .spacing(2),
            )
            .width(Length::Fill)
            .on_press(Message::SelectInstance(index));

            let pin = if is_pinned {
                button(text("Unpin").size(12)).on_press(Message::PinForCompare(None))
            } else {
                button(text("Compare").size(12)).on_press(Message::PinForCompare(Some(index)))
            };

            column.push(
                row![select, pin]
                    .spacing(6)
                    .align_y(Alignment::Center),
            )
        })
}
