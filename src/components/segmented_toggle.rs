use crate::message::Message;
use iced::widget::text::Wrapping;
use iced::widget::{button, container, text, Container, Row};
use iced::{Alignment, Background, Color, Length, Shadow, Theme};

/// A pill-shaped row of mutually exclusive options; the one equal to
/// `current` is highlighted.
pub fn segmented_toggle<T>(
    options: &[T],
    current: T,
    on_select: impl Fn(T) -> Message,
) -> Container<'static, Message>
where
    T: Copy + PartialEq + ToString,
{
    let last = options.len().saturating_sub(1);
    let segments = options
        .iter()
        .enumerate()
        .fold(Row::new().spacing(0), |segments, (index, option)| {
            let position = match (index == 0, index == last) {
                (true, true) => SegmentPosition::Only,
                (true, false) => SegmentPosition::First,
                (false, true) => SegmentPosition::Last,
                (false, false) => SegmentPosition::Middle,
            };
            segments.push(
                segment(option.to_string(), *option == current, position)
                    .on_press(on_select(*option))
                    .width(Length::FillPortion(1)),
            )
        });

    container(segments)
        .padding(3)
        .width(Length::Fill)
        .style(segmented_container_style)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentPosition {
    First,
    Middle,
    Last,
    Only,
}

fn segment(
    label: String,
    is_active: bool,
    position: SegmentPosition,
) -> iced::widget::Button<'static, Message> {
    let content = container(text(label).size(14).wrapping(Wrapping::None))
        .width(Length::Fill)
        .height(Length::Fixed(30.0))
        .align_x(Alignment::Center)
        .align_y(Alignment::Center)
        .padding([6, 12]);

    button(content)
        .padding(0)
        .style(move |theme, status| segment_style(theme, status, is_active, position))
}

fn segmented_container_style(theme: &Theme) -> iced::widget::container::Style {
    let palette = theme.extended_palette();

    iced::widget::container::Style {
        background: Some(Background::Color(palette.background.strong.color)),
        border: iced::border::Border {
            color: palette.background.strong.color.scale_alpha(0.6),
            width: 1.0,
            radius: iced::border::Radius::new(999.0),
        },
        ..Default::default()
    }
}

fn segment_style(
    theme: &Theme,
    status: iced::widget::button::Status,
    is_active: bool,
    position: SegmentPosition,
) -> iced::widget::button::Style {
    let palette = theme.extended_palette();

    let background_color = match (status, is_active) {
        (iced::widget::button::Status::Hovered, true) => palette.primary.base.color,
        (iced::widget::button::Status::Hovered, false) => {
            palette.background.base.color.scale_alpha(0.8)
        }
        (iced::widget::button::Status::Pressed, true) => {
            palette.primary.base.color.scale_alpha(0.9)
        }
        (iced::widget::button::Status::Pressed, false) => {
            palette.background.base.color.scale_alpha(0.9)
        }
        (iced::widget::button::Status::Disabled, _) => {
            palette.background.strong.color.scale_alpha(0.2)
        }
        (iced::widget::button::Status::Active, true) => palette.primary.strong.color,
        (iced::widget::button::Status::Active, false) => {
            palette.background.strong.color.scale_alpha(0.4)
        }
    };

    let text_color = if is_active {
        palette.primary.strong.text
    } else {
        palette.background.base.text
    };

    let (outer, inner) = (999.0, 6.0);
    let (left, right) = match position {
        SegmentPosition::First => (outer, inner),
        SegmentPosition::Middle => (inner, inner),
        SegmentPosition::Last => (inner, outer),
        SegmentPosition::Only => (outer, outer),
    };

    iced::widget::button::Style {
        background: Some(Background::Color(background_color)),
        text_color,
        border: iced::border::Border {
            color: Color::TRANSPARENT,
            width: 0.0,
            radius: iced::border::Radius {
                top_left: left,
                top_right: right,
                bottom_right: right,
                bottom_left: left,
            },
        },
        shadow: Shadow::default(),
    }
}
