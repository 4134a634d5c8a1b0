/// The uploader screen
///
/// Wires the session state machine to the adapters: every user action or
/// adapter completion arrives as a `Message`, `Session` decides, and the
/// decision comes back as an `Effect` that the runtime turns into a task
/// running the next adapter.

use futures::future::{BoxFuture, FutureExt};
use iced::widget::{button, column, container, image, row, text, Column};
use iced::{Alignment, Color, ContentFit, Element, Length, Task, Theme};
use std::sync::Arc;

use crate::alert::AlertPresenter;
use crate::media::converter::{ConversionError, JpegConverter};
use crate::media::picker::{self, MediaLibrary, PickOutcome};
use crate::state::data::{Alert, AssetRef, ConvertedAsset, RequestToken, StatusLine};
use crate::state::session::{ConversionReaction, Phase, PickReaction, Session};
use crate::upload::{ImageHost, UploadError, UploadReceipt};

/// The adapters the screen drives
#[derive(Clone)]
pub struct Services {
    pub library: Arc<dyn MediaLibrary>,
    pub converter: Arc<dyn JpegConverter>,
    pub host: Arc<dyn ImageHost>,
    pub alerts: Arc<dyn AlertPresenter>,
}

/// Identifies one raised alert, so a dismissal only clears its own mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertId(u64);

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked "Select Image"
    SelectImage,
    /// Permission request + picker finished
    Picked(PickOutcome),
    /// Background conversion finished
    Converted(RequestToken, Result<ConvertedAsset, Arc<ConversionError>>),
    /// User clicked "Upload"
    Upload,
    /// Upload request finished
    Uploaded(Result<UploadReceipt, Arc<UploadError>>),
    /// The user closed a blocking alert
    AlertDismissed(AlertId),
}

/// Work the screen asks for after handling a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Request permission and open the picker
    Pick,
    /// Convert `asset`; the result is reported with `token`
    Convert(RequestToken, AssetRef),
    Upload(ConvertedAsset),
    /// Show a blocking alert
    Alert(AlertId, Alert),
}

impl Effect {
    /// Run the effect against `services`. The future resolves to the
    /// message reporting its completion.
    fn into_future(self, services: Services) -> Option<BoxFuture<'static, Message>> {
        let future = match self {
            Effect::None => return None,
            Effect::Pick => async move {
                Message::Picked(picker::request_and_pick(services.library.as_ref()).await)
            }
            .boxed(),
            Effect::Convert(token, asset) => async move {
                let result = services
                    .converter
                    .convert_to_jpeg(token, asset)
                    .await
                    .map_err(Arc::new);
                Message::Converted(token, result)
            }
            .boxed(),
            Effect::Upload(asset) => async move {
                Message::Uploaded(services.host.upload(asset).await.map_err(Arc::new))
            }
            .boxed(),
            Effect::Alert(id, alert) => async move {
                services.alerts.present(alert).await;
                Message::AlertDismissed(id)
            }
            .boxed(),
        };
        Some(future)
    }
}

/// Main screen state
pub struct Screen {
    session: Session,
    services: Services,
    /// Alert currently on screen, if any
    alert: Option<(AlertId, Alert)>,
    last_alert: u64,
}

impl Screen {
    pub fn new(services: Services) -> Self {
        Self {
            session: Session::new(),
            services,
            alert: None,
            last_alert: 0,
        }
    }

    /// Handle application messages and update state
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match self.react(message).into_future(self.services.clone()) {
            Some(future) => Task::perform(future, std::convert::identity),
            None => Task::none(),
        }
    }

    /// Apply `message` to the session and decide what runs next
    fn react(&mut self, message: Message) -> Effect {
        match message {
            Message::SelectImage => Effect::Pick,
            Message::Picked(outcome) => match self.session.accept_pick(outcome) {
                // Conversion is chained explicitly after a successful pick
                PickReaction::Convert(token, asset) => Effect::Convert(token, asset),
                PickReaction::Alert(alert) => self.raise(alert),
                PickReaction::Nothing => Effect::None,
            },
            Message::Converted(token, result) => {
                if self.session.accept_conversion(token, result) == ConversionReaction::Stale {
                    tracing::debug!("Ignored stale conversion {}", token);
                }
                Effect::None
            }
            Message::Upload => match self.session.begin_upload() {
                Some(asset) => Effect::Upload(asset),
                None => Effect::None,
            },
            Message::Uploaded(result) => {
                let alert = self.session.finish_upload(result);
                self.raise(alert)
            }
            Message::AlertDismissed(id) => {
                if matches!(&self.alert, Some((current, _)) if *current == id) {
                    self.alert = None;
                }
                Effect::None
            }
        }
    }

    fn raise(&mut self, alert: Alert) -> Effect {
        self.last_alert += 1;
        let id = AlertId(self.last_alert);
        self.alert = Some((id, alert.clone()));
        Effect::Alert(id, alert)
    }

    /// Build the user interface
    pub fn view(&self) -> Element<Message> {
        let mut content: Column<Message> = column![text("📸 Image Uploader").size(32)]
            .spacing(20)
            .padding(40)
            .align_x(Alignment::Center);

        if let Some(converted) = self.session.converted() {
            content = content.push(
                image(image::Handle::from_path(&converted.path))
                    .width(Length::Fill)
                    .height(Length::Fixed(300.0))
                    .content_fit(ContentFit::Cover),
            );
        }

        let uploading = self.session.is_uploading();
        let select = button(text("Select Image"))
            .on_press(Message::SelectImage)
            .padding(12)
            .width(Length::Fill);
        // Green once there is something to send, grey otherwise
        let upload_style: fn(&Theme, button::Status) -> button::Style =
            if self.session.converted().is_some() {
                button::success
            } else {
                button::secondary
            };
        let upload = button(text(if uploading { "Uploading..." } else { "Upload" }))
            .on_press_maybe(self.session.upload_enabled().then_some(Message::Upload))
            .style(upload_style)
            .padding(12)
            .width(Length::Fill);

        content = content.push(row![select, upload].spacing(10));

        if self.session.phase() == Phase::Uploading {
            content = content.push(text("⏳ Uploading...").size(20));
        } else if let (true, Some(selected)) = (self.session.is_converting(), self.session.selected()) {
            content = content.push(text(format!("⏳ Converting {}...", selected.display_name())).size(20));
        }

        // Mirror of the modal so the outcome stays visible behind it
        if let Some((_, alert)) = &self.alert {
            content = content.push(text(alert.title.as_str()).size(18));
            if let Some(body) = &alert.body {
                content = content.push(text(body.as_str()).size(14));
            }
        }

        let status = self.session.status();
        if *status != StatusLine::Empty {
            let color = if status.is_error() {
                Color::from_rgb(0.86, 0.15, 0.15)
            } else {
                Color::from_rgb(0.42, 0.45, 0.50)
            };
            content = content.push(text(status.text()).size(16).color(color));
        }

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    /// Set the application theme
    pub fn theme(&self) -> Theme {
        Theme::Light
    }
}
