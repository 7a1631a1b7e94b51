use iced::widget::{button, column, container, horizontal_space, row, text, Canvas, Row, Space};
use iced::{Background, Border, Color, Element, Length, Padding};

use lyra_core::{Tab, WrapMode};

use crate::app::{App, Message};
use crate::editor_canvas::EditorCanvas;
use crate::theme::{colors, STATUS_BAR_HEIGHT, TAB_BAR_HEIGHT};

impl App {
    pub fn view(&self) -> Element<'_, Message> {
        let content = column![self.view_tabs(), self.view_editor(), self.view_status_bar()];

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_| container::Style {
                background: Some(Background::Color(colors::BG_DARK)),
                ..Default::default()
            })
            .into()
    }

    pub fn view_tabs(&self) -> Element<'_, Message> {
        let active = self.tabs.active_id();
        let mut tabs_vec: Vec<Element<'_, Message>> = self
            .tabs
            .iter()
            .map(|tab| self.make_tab(tab, active == Some(tab.id())))
            .collect();

        tabs_vec.push(horizontal_space().into());

        let tabs_row = Row::with_children(tabs_vec)
            .spacing(1)
            .align_y(iced::Alignment::End);

        container(tabs_row)
            .width(Length::Fill)
            .height(TAB_BAR_HEIGHT)
            .style(|_| container::Style {
                background: Some(Background::Color(colors::BG_MEDIUM)),
                border: Border {
                    color: colors::BORDER,
                    width: 1.0,
                    radius: 0.0.into(),
                },
                ..Default::default()
            })
            .into()
    }

    pub fn make_tab(&self, tab: &Tab, is_active: bool) -> Element<'_, Message> {
        let close_btn = button(text("x").size(12).color(colors::TEXT_MUTED))
            .padding(Padding::from([2, 6]))
            .style(|_, status| {
                let bg = match status {
                    button::Status::Hovered => colors::BG_HOVER,
                    _ => Color::TRANSPARENT,
                };
                button::Style {
                    background: Some(Background::Color(bg)),
                    text_color: colors::TEXT_PRIMARY,
                    border: Border {
                        radius: 2.0.into(),
                        ..Default::default()
                    },
                    ..Default::default()
                }
            })
            .on_press(Message::CloseTab(tab.id()));

        let tab_content = row![
            text(tab.display_title()).size(13).color(if is_active {
                colors::TEXT_PRIMARY
            } else {
                colors::TEXT_SECONDARY
            }),
            Space::with_width(8),
            close_btn,
        ]
        .align_y(iced::Alignment::Center);

        let bg = if is_active {
            colors::BG_DARK
        } else {
            colors::BG_MEDIUM
        };

        button(tab_content)
            .padding(Padding::from([8, 14]))
            .style(move |_, status| {
                let hover_bg = match status {
                    button::Status::Hovered if !is_active => colors::BG_HOVER,
                    _ => bg,
                };
                button::Style {
                    background: Some(Background::Color(hover_bg)),
                    text_color: colors::TEXT_PRIMARY,
                    border: Border {
                        color: if is_active {
                            colors::ACCENT
                        } else {
                            Color::TRANSPARENT
                        },
                        width: if is_active { 2.0 } else { 0.0 },
                        radius: 0.0.into(),
                    },
                    ..Default::default()
                }
            })
            .on_press(Message::TabSelected(tab.id()))
            .into()
    }

    pub fn view_editor(&self) -> Element<'_, Message> {
        let editor = self
            .tabs
            .active()
            .and_then(|tab| Some((tab, self.caches.get(&tab.id())?)));

        match editor {
            Some((tab, cache)) => Canvas::new(EditorCanvas {
                editor: tab.editor(),
                cache,
                font_size: self.font_size,
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
            None => container(text("No file open").size(14).color(colors::TEXT_MUTED))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        }
    }

    pub fn view_status_bar(&self) -> Element<'_, Message> {
        let tab = self.tabs.active();

        let cursor_info = tab
            .map(|t| {
                let caret = t.editor().surface().caret();
                format!("Ln {}, Col {}", caret.line + 1, caret.column + 1)
            })
            .unwrap_or_else(|| "Ln 1, Col 1".to_string());

        let file_info = tab
            .map(|t| t.display_title())
            .unwrap_or_else(|| "No file".to_string());

        let language_info = tab
            .map(|t| t.language().to_string())
            .unwrap_or_else(|| lyra_core::language::PLAIN_TEXT.to_string());

        let wrap_info = match tab.map(|t| t.editor().surface().wrap()) {
            Some(WrapMode::Viewport) => "Wrap",
            _ => "No Wrap",
        };

        let status_content = row![
            text(&self.status_message)
                .size(12)
                .color(colors::TEXT_SECONDARY),
            horizontal_space(),
            text(file_info).size(12).color(colors::TEXT_SECONDARY),
            Space::with_width(24),
            text(cursor_info).size(12).color(colors::TEXT_PRIMARY),
            Space::with_width(24),
            text(language_info).size(12).color(colors::ACCENT),
            Space::with_width(24),
            text(wrap_info).size(12).color(colors::TEXT_SECONDARY),
            Space::with_width(12),
        ]
        .padding(Padding::from([6, 12]))
        .align_y(iced::Alignment::Center);

        container(status_content)
            .width(Length::Fill)
            .height(STATUS_BAR_HEIGHT)
            .style(|_| container::Style {
                background: Some(Background::Color(colors::BG_MEDIUM)),
                border: Border {
                    color: colors::BORDER,
                    width: 1.0,
                    radius: 0.0.into(),
                },
                ..Default::default()
            })
            .into()
    }
}
