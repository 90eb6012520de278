use crate::message::Message;
use crate::model::{compare_metadata, DicomView};
use iced::widget::text::Wrapping;
use iced::widget::{column, row, scrollable, text};
use iced::{Color, Element, Length};

const DIFFERENCE_COLOR: Color = Color::from_rgb(0.95, 0.65, 0.25);

pub fn metadata_panel<'a>(
    view: Option<&'a DicomView>,
    compare_with: Option<&'a DicomView>,
    entries_empty: bool,
) -> Element<'a, Message> {
    match (view, compare_with) {
        (Some(view), Some(other)) if view.file_path != other.file_path => {
            comparison_panel(view, other)
        }
        (Some(view), _) => metadata_table(view),
        (None, _) if entries_empty => text("Import DICOM instances to view their metadata").into(),
        (None, _) => text("Select an instance to inspect metadata").into(),
    }
}

fn metadata_table(view: &DicomView) -> Element<'_, Message> {
    let mut table = column![row![
        text("Tag").width(Length::FillPortion(1)),
        text("VR").width(Length::FillPortion(1)),
        text("Alias").width(Length::FillPortion(2)),
        text("Value").width(Length::FillPortion(4)),
    ]
    .spacing(12)];

    for row in &view.metadata {
        table = table.push(
            row![
                text(&row.tag).width(Length::FillPortion(1)),
                text(&row.vr).width(Length::FillPortion(1)),
                text(&row.alias).width(Length::FillPortion(2)),
                text(&row.value)
                    .width(Length::FillPortion(4))
                    .wrapping(Wrapping::Word),
            ]
            .spacing(12),
        );
    }

    column![
        text(format!("File: {}", view.file_path.display())).size(16),
        scrollable(table.spacing(8)),
    ]
    .spacing(12)
    .into()
}

fn comparison_panel<'a>(left: &'a DicomView, right: &'a DicomView) -> Element<'a, Message> {
    let rows = compare_metadata(&left.metadata, &right.metadata);
    let differing = rows.iter().filter(|row| row.differs()).count();

    let mut table = column![row![
        text("Tag").width(Length::FillPortion(1)),
        text("Alias").width(Length::FillPortion(2)),
        text(left.file_name()).width(Length::FillPortion(3)),
        text(right.file_name()).width(Length::FillPortion(3)),
    ]
    .spacing(12)];

    for row in rows {
        let color = row.differs().then_some(DIFFERENCE_COLOR);
        let cell = |value: Option<String>| {
            text(value.unwrap_or_else(|| "—".to_string()))
                .width(Length::FillPortion(3))
                .wrapping(Wrapping::Word)
                .color_maybe(color)
        };
        table = table.push(
            row![
                text(row.tag).width(Length::FillPortion(1)).color_maybe(color),
                text(row.alias).width(Length::FillPortion(2)),
                cell(row.left),
                cell(row.right),
            ]
            .spacing(12),
        );
    }

    column![
        text(format!("Comparing with {}", right.file_name())).size(16),
        text(format!("{differing} differing attribute(s)")).size(13),
        scrollable(table.spacing(8)),
    ]
    .spacing(12)
    .into()
}
