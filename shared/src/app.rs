use secrecy::{ExposeSecret, SecretString};

use crate::api::{
    self, ChatForm, ChatReply, CredentialsBody, ErrorBody, HealthBody, LoginResponse, Reply,
};
use crate::capabilities::{
    Capabilities, HttpError, HttpResult, KeyValueError, KvResult, PickConfig, PickerOutput,
    PickerResult,
};
use crate::config::Config;
use crate::event::Event;
use crate::model::{
    Alert, ChatRoute, ConversationEntry, ImageUri, LastReply, Model, OutgoingMessage,
    PendingImage, Screen, ServerStatus,
};
use crate::{
    AlertView, AppError, EntryView, ErrorKind, ScreenView, ViewModel, AUTHENTICATION_FAILED,
    EMERGENCY_MESSAGE, EMERGENCY_TITLE, EMPTY_COMPOSITION, INVALID_CREDENTIALS, SERVER_NOT_REACHABLE,
    SESSION_NOT_SAVED, SIGNUP_FAILED, SIGNUP_SUCCEEDED, THINKING_PLACEHOLDER,
};

/// The session and conversation controller.
#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let span = tracing::debug_span!(
            "update",
            event = event.name(),
            screen = %model.screen,
            user = event.is_user_initiated()
        );
        let _enter = span.enter();

        match event {
            Event::Configure(config) => Self::configure(*config, model, caps),

            Event::Navigate(target) => Self::navigate(target, model, caps),

            Event::EmailChanged(email) => {
                if Self::on_screen(model, Screen::Auth) {
                    model.credentials.email = email;
                    caps.render.render();
                }
            }

            Event::PasswordChanged(password) => {
                if Self::on_screen(model, Screen::Auth) {
                    model.credentials.password = password;
                    caps.render.render();
                }
            }

            Event::SignupRequested => {
                let url = api::endpoint(&model.config.api_base_url, api::SIGNUP_PATH);
                let request = caps
                    .http
                    .post(url)
                    .body_json(&CredentialsBody::from(&model.credentials));
                match request {
                    Ok(request) => request.send(|result| Event::SignupResponse(Box::new(result))),
                    Err(e) => Self::raise(model, caps, &Self::build_failed(&e)),
                }
            }

            Event::SignupResponse(result) => {
                Self::on_signup_response(*result, model);
                caps.render.render();
            }

            Event::LoginRequested => {
                let url = api::endpoint(&model.config.api_base_url, api::LOGIN_PATH);
                let request = caps
                    .http
                    .post(url)
                    .body_json(&CredentialsBody::from(&model.credentials));
                match request {
                    Ok(request) => request.send(|result| Event::LoginResponse(Box::new(result))),
                    Err(e) => Self::raise(model, caps, &Self::build_failed(&e)),
                }
            }

            Event::LoginResponse(result) => Self::on_login_response(*result, model, caps),

            Event::TokenStored(result) => Self::on_token_stored(*result, model, caps),

            Event::MessageChanged(message) => {
                if Self::on_screen(model, Screen::Chat) {
                    model.composition.message = message;
                    caps.render.render();
                }
            }

            Event::PickImageRequested => {
                if Self::on_screen(model, Screen::Chat) {
                    let config = PickConfig::default().with_quality(model.config.picker_quality);
                    caps.picker
                        .pick_image(config, |result| Event::ImagePicked(Box::new(result)));
                }
            }

            Event::ImagePicked(result) => {
                if Self::on_screen(model, Screen::Chat) {
                    Self::on_image_picked(*result, model, caps);
                }
            }

            Event::SendRequested => Self::send_message(model, caps),

            Event::TokenLoaded { outgoing, result } => {
                Self::dispatch_chat(*outgoing, *result, model, caps);
            }

            Event::SendResponse(result) => Self::on_send_response(*result, model, caps),

            Event::DismissAlert => {
                if model.alert.take().is_some() {
                    caps.render.render();
                }
            }

            Event::HealthCheckRequested => {
                let url = api::endpoint(&model.config.api_base_url, api::HEALTH_PATH);
                caps.http
                    .get(url)
                    .send(|result| Event::HealthResponse(Box::new(result)));
            }

            Event::HealthResponse(result) => {
                model.server_status = Self::server_status(*result);
                tracing::info!(status = ?model.server_status, "health check finished");
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        let screen = match model.screen {
            Screen::Auth => ScreenView::Auth {
                email: model.credentials.email.clone(),
                has_password: !model.credentials.password.is_empty(),
            },
            Screen::Home => ScreenView::Home,
            Screen::Chat => {
                let mut entries: Vec<EntryView> = model
                    .conversation
                    .entries()
                    .iter()
                    .map(EntryView::from)
                    .collect();
                if model.is_loading {
                    entries.push(EntryView::placeholder(THINKING_PLACEHOLDER));
                }

                ScreenView::Chat {
                    entries,
                    message: model.composition.message.clone(),
                    pending_image: model
                        .composition
                        .image
                        .as_ref()
                        .map(|image| image.uri.as_str().to_string()),
                    is_loading: model.is_loading,
                    can_send: !model.is_loading && model.composition.outgoing().is_some(),
                    last_route: model.last_reply.as_ref().map(|r| r.route),
                    image_prediction: model
                        .last_reply
                        .as_ref()
                        .and_then(|r| r.image_prediction.clone()),
                }
            }
            Screen::Emergency => ScreenView::Emergency {
                title: EMERGENCY_TITLE.into(),
                message: EMERGENCY_MESSAGE.into(),
            },
        };

        ViewModel {
            screen,
            alert: model.alert.as_ref().map(AlertView::from),
            server_status: model.server_status,
        }
    }
}

impl App {
    fn configure(config: Config, model: &mut Model, caps: &Capabilities) {
        match config.validate() {
            Ok(()) => {
                tracing::info!(
                    base_url = %config.api_base_url,
                    timeout_ms = config.request_timeout_ms,
                    "configured"
                );
                model.config = config;
                caps.render.render();
            }
            Err(e) => tracing::error!(error = %e, "configuration rejected, keeping the previous one"),
        }
    }

    fn on_screen(model: &Model, screen: Screen) -> bool {
        if model.screen == screen {
            true
        } else {
            tracing::debug!(expected = %screen, "input ignored on this screen");
            false
        }
    }

    fn navigate(target: Screen, model: &mut Model, caps: &Capabilities) {
        if model.screen == Screen::Auth {
            tracing::warn!(target = %target, "navigation requires a login first");
            return;
        }
        if target == Screen::Auth {
            tracing::warn!("there is no way back to the auth screen");
            return;
        }
        if model.screen == target {
            return;
        }

        tracing::info!(from = %model.screen, to = %target, "navigating");
        model.screen = target;
        caps.render.render();
    }

    fn build_failed(error: &HttpError) -> AppError {
        tracing::error!(error = %error, "could not build request");
        AppError::from_http(error)
    }

    fn raise(model: &mut Model, caps: &Capabilities, error: &AppError) {
        tracing::warn!(code = error.code(), error = %error, "raising alert");
        model.alert = Some(Alert::error(error.user_facing_message()));
        caps.render.render();
    }

    // --- Auth ---

    fn on_signup_response(result: HttpResult, model: &mut Model) {
        match Reply::from_result(result) {
            Ok(reply) if reply.is_success() => {
                tracing::info!(status = reply.status, "signup succeeded");
                model.alert = Some(Alert::success(SIGNUP_SUCCEEDED));
            }
            Ok(reply) => {
                let detail = reply
                    .json::<ErrorBody>()
                    .ok()
                    .and_then(|body| body.detail_text());
                tracing::warn!(status = reply.status, detail = ?detail, "signup rejected");
                model.alert = Some(Alert::error(SIGNUP_FAILED));
            }
            Err(e) => {
                tracing::warn!(error = %e, "signup request failed");
                model.alert = Some(Alert::error(SERVER_NOT_REACHABLE));
            }
        }
    }

    fn on_login_response(result: HttpResult, model: &mut Model, caps: &Capabilities) {
        let reply = match Reply::from_result(result) {
            Ok(reply) => reply,
            Err(e) => return Self::raise(model, caps, &AppError::from_http(&e)),
        };

        if !reply.is_success() {
            let detail = reply
                .json::<ErrorBody>()
                .ok()
                .and_then(|body| body.detail_text());
            tracing::warn!(status = reply.status, detail = ?detail, "login rejected");
            return Self::raise(
                model,
                caps,
                &AppError::new(ErrorKind::Authentication, INVALID_CREDENTIALS)
                    .with_context("http_status", reply.status.to_string()),
            );
        }

        let body: LoginResponse = match reply.json() {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "login succeeded without a usable token");
                return Self::raise(model, caps, &AppError::from_http(&e));
            }
        };

        tracing::info!(token_type = ?body.token_type, "login succeeded, storing token");
        let token = body.access_token.expose_secret().as_bytes().to_vec();
        caps.kv.set(model.config.token_key.clone(), token, |result| {
            Event::TokenStored(Box::new(result))
        });
    }

    fn on_token_stored(result: KvResult, model: &mut Model, caps: &Capabilities) {
        match result {
            Ok(_) => {
                model.credentials.clear();
                if model.screen == Screen::Auth {
                    model.screen = Screen::Home;
                }
                tracing::info!(screen = %model.screen, "session started");
                caps.render.render();
            }
            Err(e) => {
                let cause = AppError::from(e);
                tracing::error!(code = cause.code(), error = %cause, "could not persist token");
                Self::raise(
                    model,
                    caps,
                    &AppError::new(ErrorKind::Storage, SESSION_NOT_SAVED)
                        .with_context("cause", cause.message),
                );
            }
        }
    }

    // --- Chat ---

    fn on_image_picked(result: PickerResult, model: &mut Model, caps: &Capabilities) {
        match result {
            Ok(PickerOutput::Picked(asset)) => {
                tracing::debug!(
                    mime = ?asset.mime_type,
                    bytes = asset.data.len(),
                    "image picked"
                );
                let uri = ImageUri::new(asset.uri);
                model.conversation.push(ConversationEntry::user_image(&uri));
                model.composition.image = Some(PendingImage::new(uri, asset.data));
                caps.render.render();
            }
            Ok(PickerOutput::Cancelled) => tracing::debug!("picker cancelled"),
            Err(e) => {
                let error = AppError::from_picker(&e);
                tracing::warn!(code = error.code(), error = %e, "picker failed");
            }
        }
    }

    fn send_message(model: &mut Model, caps: &Capabilities) {
        if model.is_loading {
            tracing::warn!("send ignored: a reply is still pending");
            return;
        }

        let Some(outgoing) = model.composition.outgoing() else {
            return Self::raise(
                model,
                caps,
                &AppError::new(ErrorKind::Validation, EMPTY_COMPOSITION),
            );
        };

        model.is_loading = true;
        if let Some(text) = &outgoing.text {
            model.conversation.push(ConversationEntry::user_text(text.as_str()));
        }
        tracing::info!(
            has_text = outgoing.text.is_some(),
            has_image = outgoing.image.is_some(),
            entries = model.conversation.len(),
            "sending message"
        );
        caps.render.render();

        let outgoing = Box::new(outgoing);
        caps.kv.get(model.config.token_key.clone(), move |result| Event::TokenLoaded {
            outgoing,
            result: Box::new(result),
        });
    }

    fn dispatch_chat(
        outgoing: OutgoingMessage,
        result: KvResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        // Spent once the token read returns, whatever it returned.
        model.composition.clear();

        let token = match Self::token_from(result) {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::warn!("no session token stored");
                return Self::finish_send(
                    model,
                    caps,
                    &AppError::new(ErrorKind::Application, AUTHENTICATION_FAILED),
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "could not read session token");
                return Self::finish_send(
                    model,
                    caps,
                    &AppError::new(ErrorKind::Transport, SERVER_NOT_REACHABLE)
                        .with_context("cause", e.to_string()),
                );
            }
        };

        let authorization = match api::bearer(&token) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "could not build chat request");
                return Self::finish_send(model, caps, &AppError::from_request(&e));
            }
        };

        let form = ChatForm::encode(&outgoing);
        tracing::debug!(form = ?form, "posting chat form");
        let content_type = form.content_type();
        caps.render.render();
        caps.http
            .post(api::endpoint(&model.config.api_base_url, api::CHAT_SEND_PATH))
            .header("Authorization", authorization.as_str())
            .body_bytes(form.into_body())
            .header("Content-Type", content_type.as_str())
            .send(|result| Event::SendResponse(Box::new(result)));
    }

    fn token_from(result: KvResult) -> Result<Option<SecretString>, KeyValueError> {
        match result? {
            Some(bytes) => String::from_utf8(bytes)
                .map(|token| Some(SecretString::new(token)))
                .map_err(|_| KeyValueError::Other {
                    message: "stored token is not UTF-8".into(),
                }),
            None => Ok(None),
        }
    }

    fn on_send_response(result: HttpResult, model: &mut Model, caps: &Capabilities) {
        let reply = match Reply::from_result(result) {
            Ok(reply) => reply,
            Err(e) => return Self::finish_send(model, caps, &AppError::from_http(&e)),
        };

        if !reply.is_success() {
            let error = match reply.json::<ErrorBody>() {
                Ok(body) => AppError::from_detail(reply.status, body.detail_text()),
                Err(e) => {
                    tracing::warn!(status = reply.status, error = %e, "unreadable error body");
                    AppError::from_http(&e)
                }
            };
            return Self::finish_send(model, caps, &error);
        }

        match reply.json::<ChatReply>() {
            Ok(reply) => {
                model.is_loading = false;
                model.last_reply = Some(LastReply {
                    route: reply.route.unwrap_or(ChatRoute::Unknown),
                    image_prediction: reply.image_prediction,
                });
                model.conversation.push(ConversationEntry::assistant_text(reply.reply));
                tracing::info!(entries = model.conversation.len(), "reply received");
                caps.render.render();
            }
            Err(e) => Self::finish_send(model, caps, &AppError::from_http(&e)),
        }
    }

    /// Ends a failed send: the error becomes an assistant entry.
    fn finish_send(model: &mut Model, caps: &Capabilities, error: &AppError) {
        tracing::warn!(code = error.code(), error = %error, "send failed");
        model.is_loading = false;
        model
            .conversation
            .push(ConversationEntry::assistant_text(error.user_facing_message()));
        caps.render.render();
    }

    fn server_status(result: HttpResult) -> ServerStatus {
        match Reply::from_result(result) {
            Ok(reply) if reply.is_success() => match reply.json::<HealthBody>() {
                Ok(body) if body.is_ok() => ServerStatus::Reachable,
                _ => ServerStatus::Unreachable,
            },
            Ok(_) | Err(_) => ServerStatus::Unreachable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{PickedAsset, PickerError, PickerOperation};
    use crate::model::{EntryKind, Origin};
    use crate::Effect;
    use assert_matches::assert_matches;
    use crux_core::capability::Operation;
    use crux_core::testing::AppTester;
    use crux_core::Request;
    use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult as HttpOutcome};
    use crux_kv::value::Value;
    use crux_kv::{KeyValueOperation, KeyValueResponse, KeyValueResult};

    type Tester = AppTester<App, Effect>;

    fn json_reply(status: u16, body: serde_json::Value) -> HttpOutcome {
        HttpOutcome::Ok(HttpResponse {
            status,
            headers: vec![],
            body: serde_json::to_vec(&body).unwrap(),
        })
    }

    fn take_http(effects: Vec<Effect>) -> Request<HttpRequest> {
        effects
            .into_iter()
            .find_map(|e| match e {
                Effect::Http(request) => Some(request),
                _ => None,
            })
            .expect("an http effect")
    }

    fn take_kv(effects: Vec<Effect>) -> Request<KeyValueOperation> {
        effects
            .into_iter()
            .find_map(|e| match e {
                Effect::KeyValue(request) => Some(request),
                _ => None,
            })
            .expect("a key-value effect")
    }

    fn take_picker(effects: Vec<Effect>) -> Request<PickerOperation> {
        effects
            .into_iter()
            .find_map(|e| match e {
                Effect::ImagePicker(request) => Some(request),
                _ => None,
            })
            .expect("a picker effect")
    }

    /// Resolves `request` and feeds the resulting events back into the app.
    fn resolve<Op: Operation>(
        app: &Tester,
        model: &mut Model,
        request: &mut Request<Op>,
        output: Op::Output,
    ) -> Vec<Effect> {
        let update = app.resolve(request, output).unwrap();
        update
            .events
            .into_iter()
            .flat_map(|event| app.update(event, model).effects)
            .collect()
    }

    fn logged_in(app: &Tester) -> Model {
        let mut model = Model::default();
        app.update(Event::EmailChanged("a@b.c".into()), &mut model);
        app.update(Event::PasswordChanged("pw".into()), &mut model);

        let mut login = take_http(app.update(Event::LoginRequested, &mut model).effects);
        let effects = resolve(
            app,
            &mut model,
            &mut login,
            json_reply(200, serde_json::json!({"access_token": "tok123"})),
        );
        let mut write = take_kv(effects);
        resolve(
            app,
            &mut model,
            &mut write,
            KeyValueResult::Ok {
                response: KeyValueResponse::Set {
                    previous: Value::None,
                },
            },
        );
        model
    }

    #[test]
    fn navigation_from_auth_is_ignored() {
        let app = Tester::default();
        let mut model = Model::default();
        let update = app.update(Event::Navigate(Screen::Chat), &mut model);
        assert!(update.effects.is_empty());
        assert_eq!(model.screen, Screen::Auth);
    }

    #[test]
    fn navigation_between_main_screens() {
        let app = Tester::default();
        let mut model = logged_in(&app);
        assert_eq!(model.screen, Screen::Home);

        app.update(Event::Navigate(Screen::Emergency), &mut model);
        assert_eq!(model.screen, Screen::Emergency);
        assert_matches!(app.view(&model).screen, ScreenView::Emergency { .. });

        let update = app.update(Event::Navigate(Screen::Auth), &mut model);
        assert!(update.effects.is_empty());
        assert_eq!(model.screen, Screen::Emergency);

        app.update(Event::Navigate(Screen::Home), &mut model);
        assert_eq!(model.screen, Screen::Home);
    }

    #[test]
    fn login_clears_credentials() {
        let app = Tester::default();
        let model = logged_in(&app);
        assert!(model.credentials.email.is_empty());
        assert!(model.credentials.password.is_empty());
    }

    #[test]
    fn message_input_ignored_outside_chat() {
        let app = Tester::default();
        let mut model = logged_in(&app);
        let update = app.update(Event::MessageChanged("hi".into()), &mut model);
        assert!(update.effects.is_empty());
        assert!(model.composition.message.is_empty());
    }

    #[test]
    fn configure_replaces_config_and_rejects_invalid() {
        let app = Tester::default();
        let mut model = Model::default();

        let config = Config::new("http://10.0.2.2:8000").unwrap();
        let update = app.update(Event::Configure(Box::new(config.clone())), &mut model);
        assert!(update.effects.iter().any(|e| matches!(e, Effect::Render(_))));
        assert_eq!(model.config, config);

        let mut broken = Config::default();
        broken.picker_quality = 3.0;
        let update = app.update(Event::Configure(Box::new(broken)), &mut model);
        assert!(update.effects.is_empty());
        assert_eq!(model.config, config);

        let request = take_http(app.update(Event::HealthCheckRequested, &mut model).effects);
        assert_eq!(request.operation.url, "http://10.0.2.2:8000/health");
    }

    #[test]
    fn picker_uses_configured_quality() {
        let app = Tester::default();
        let mut model = logged_in(&app);
        let config = Config::default().with_picker_quality(0.4).unwrap();
        app.update(Event::Configure(Box::new(config)), &mut model);
        app.update(Event::Navigate(Screen::Chat), &mut model);

        let request = take_picker(app.update(Event::PickImageRequested, &mut model).effects);
        let PickerOperation::PickImage { config } = &request.operation;
        assert!((config.quality - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn picker_ignored_outside_chat() {
        let app = Tester::default();
        let mut model = Model::default();
        let update = app.update(Event::PickImageRequested, &mut model);
        assert!(update.effects.is_empty());

        let mut model = logged_in(&app);
        app.update(Event::Navigate(Screen::Chat), &mut model);
        let mut pick = take_picker(app.update(Event::PickImageRequested, &mut model).effects);
        app.update(Event::Navigate(Screen::Home), &mut model);

        let asset = PickedAsset::new("file:///a.jpg", vec![0xFF, 0xD8, 0xFF]);
        let effects = resolve(&app, &mut model, &mut pick, Ok(PickerOutput::Picked(asset)));
        assert!(effects.is_empty());
        assert!(model.conversation.is_empty());
        assert!(model.composition.image.is_none());
    }

    #[test]
    fn picker_error_changes_nothing() {
        let app = Tester::default();
        let mut model = logged_in(&app);
        app.update(Event::Navigate(Screen::Chat), &mut model);
        let mut pick = take_picker(app.update(Event::PickImageRequested, &mut model).effects);

        let effects = resolve(&app, &mut model, &mut pick, Err(PickerError::PermissionDenied));
        assert!(effects.is_empty());
        assert!(model.conversation.is_empty());
        assert!(model.composition.image.is_none());
        assert!(model.alert.is_none());
    }

    #[test]
    fn picked_image_is_shown_immediately() {
        let app = Tester::default();
        let mut model = logged_in(&app);
        app.update(Event::Navigate(Screen::Chat), &mut model);
        let mut pick = take_picker(app.update(Event::PickImageRequested, &mut model).effects);

        let asset =
            PickedAsset::new("file:///a.jpg", vec![0xFF, 0xD8, 0xFF]).with_mime_type("image/jpeg");
        resolve(&app, &mut model, &mut pick, Ok(PickerOutput::Picked(asset)));

        let entry = model.conversation.last().unwrap();
        assert_eq!(entry.kind, EntryKind::Image);
        assert_eq!(entry.origin, Origin::User);
        assert_eq!(entry.content, "file:///a.jpg");
        assert_eq!(
            model.composition.image.as_ref().map(|i| i.data.as_slice()),
            Some(&[0xFF, 0xD8, 0xFF][..])
        );
        assert_matches!(
            app.view(&model).screen,
            ScreenView::Chat { pending_image: Some(ref uri), can_send: true, .. } if uri == "file:///a.jpg"
        );
    }

    #[test]
    fn missing_token_short_circuits_send() {
        let app = Tester::default();
        let mut model = logged_in(&app);
        app.update(Event::Navigate(Screen::Chat), &mut model);
        app.update(Event::MessageChanged("hello".into()), &mut model);

        let mut read = take_kv(app.update(Event::SendRequested, &mut model).effects);
        assert_matches!(&read.operation, KeyValueOperation::Get { key } if key == "token");

        let effects = resolve(
            &app,
            &mut model,
            &mut read,
            KeyValueResult::Ok {
                response: KeyValueResponse::Get { value: Value::None },
            },
        );
        assert!(effects.iter().all(|e| matches!(e, Effect::Render(_))));
        assert!(!model.is_loading);
        assert!(model.composition.message.is_empty());
        let last = model.conversation.last().unwrap();
        assert_eq!(last.content, "Error: Authentication failed");
        assert_eq!(last.origin, Origin::Assistant);
    }

    #[test]
    fn health_check_sets_status() {
        let app = Tester::default();
        let mut model = Model::default();

        let mut check = take_http(app.update(Event::HealthCheckRequested, &mut model).effects);
        assert_eq!(check.operation.method, "GET");
        resolve(
            &app,
            &mut model,
            &mut check,
            json_reply(200, serde_json::json!({"status": "ok"})),
        );
        assert_eq!(app.view(&model).server_status, ServerStatus::Reachable);

        let mut check = take_http(app.update(Event::HealthCheckRequested, &mut model).effects);
        resolve(
            &app,
            &mut model,
            &mut check,
            HttpOutcome::Err(HttpError::Io("connection refused".into())),
        );
        assert_eq!(app.view(&model).server_status, ServerStatus::Unreachable);
    }

    #[test]
    fn dismiss_alert() {
        let app = Tester::default();
        let mut model = Model::default();
        let mut signup = take_http(app.update(Event::SignupRequested, &mut model).effects);
        resolve(
            &app,
            &mut model,
            &mut signup,
            json_reply(400, serde_json::json!({"detail": "User already exists"})),
        );
        assert_eq!(app.view(&model).alert.unwrap().message, SIGNUP_FAILED);

        let update = app.update(Event::DismissAlert, &mut model);
        assert_eq!(update.effects.len(), 1);
        assert!(app.view(&model).alert.is_none());

        assert!(app.update(Event::DismissAlert, &mut model).effects.is_empty());
    }
}
