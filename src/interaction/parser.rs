use std::fmt;
use std::path::Path;

use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;

use super::{
    anchors::PlaneAnchor,
    camera::{CameraPose, ScreenPoint, Viewport},
    features::FeatureCloud,
    Box3, Mat4, Vec3,
};

/// Seed of the synthetic clouds, so a session replays identically.
const RANDOM_CLOUD_SEED: u64 = 0x5eed;

pub struct SessionParser<'a> {
    content: &'a str,
    base_dir: Option<&'a Path>,
    buffer: String,
    position: FilePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePosition {
    pub line: u32,
    pub column: u32,
    index: u32,
}

impl FilePosition {
    fn new() -> Self {
        FilePosition {
            line: 0,
            column: 0,
            index: 0,
        }
    }

    fn on_new_line(&mut self) {
        self.line += 1;
        self.column = 0;
        self.index += 1;
    }

    fn advance(&mut self) {
        self.column += 1;
        self.index += 1;
    }
}

#[derive(Debug, Error)]
#[error("{message} at {}:{}", .position.line, .position.column)]
pub struct ParserError {
    pub position: FilePosition,
    pub message: String,
}

impl ParserError {
    fn new(message: &str, position: FilePosition) -> ParserError {
        ParserError {
            position,
            message: message.to_string(),
        }
    }

    /// Writes the offending line with a caret under the error column.
    pub fn location(&self, content: &str) -> String {
        let mut out = format!("{}\n", self);
        if let Some(line) = content.lines().nth(self.position.line as usize) {
            let spacing = " ".repeat(self.position.column as usize);
            out.push_str(&format!("{}\n{}^", line, spacing));
        }
        out
    }
}

type ParserResult<T> = Result<T, ParserError>;

/// A touch interaction replayed against the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Tap(ScreenPoint),
    Toggle(usize),
    ToggleAll,
    Pinch(f64),
    Drag(usize, ScreenPoint),
}

/// The model placed on taps: a name and its bounds before scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDesc {
    pub name: String,
    pub bounds: Box3,
}

impl Default for ModelDesc {
    fn default() -> Self {
        Self {
            name: "model".to_string(),
            bounds: Box3::new(Vec3::zero(), Vec3::new(0.5, 0.5, 0.5)),
        }
    }
}

pub struct Session {
    pub camera: CameraPose,
    pub cloud: FeatureCloud,
    pub anchors: Vec<PlaneAnchor>,
    pub model: ModelDesc,
    pub events: Vec<Event>,
}

struct CameraDesc {
    from: Vec3,
    to: Vec3,
    fov_degrees: f64,
    near: f64,
    far: f64,
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            from: Vec3::zero(),
            to: -Vec3::z_axis(),
            fov_degrees: 60.0,
            near: 0.001,
            far: 1000.0,
        }
    }
}

impl<'a> SessionParser<'a> {
    pub fn new(content: &'a str) -> SessionParser<'a> {
        SessionParser {
            content,
            base_dir: None,
            position: FilePosition::new(),
            buffer: String::new(),
        }
    }

    /// Relative paths in `features` statements are resolved against `dir`.
    pub fn with_base_dir(mut self, dir: &'a Path) -> SessionParser<'a> {
        self.base_dir = Some(dir);
        self
    }

    fn get_current_char(&self) -> Option<char> {
        self.content.chars().nth(self.position.index as usize)
    }

    fn is_empty(&mut self) -> bool {
        self.peek().is_empty()
    }

    fn advance(&mut self) -> bool {
        if let Some(current_char) = self.get_current_char() {
            if current_char == '\n' {
                self.position.on_new_line();
            } else {
                self.position.advance();
            }
            return true;
        }
        false
    }

    fn advance_until(&mut self, f: impl Fn(char) -> bool) {
        while let Some(current_char) = self.get_current_char() {
            if f(current_char) {
                break;
            }
            self.advance();
        }
    }

    fn eat_spaces(&mut self) {
        // consume all the empty lines, spaces and comments before the next token
        while let Some(current_char) = self.get_current_char() {
            if current_char == '#' {
                // the end-of-line is consumed at the end of the loop
                self.advance_until(|c| c == '\n');
            } else if !current_char.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    // push the current char to the token and return the next one
    fn enqueue(&mut self, result: &mut String) -> char {
        if let Some(current_char) = self.get_current_char() {
            result.push(current_char);
            self.advance();
        }
        self.get_current_char().unwrap_or(' ')
    }

    fn pop(&mut self) -> String {
        // check if we already peeked without eating the next token
        if !self.buffer.is_empty() {
            return std::mem::take(&mut self.buffer);
        }

        self.eat_spaces();
        let mut result = String::new();
        let Some(mut current_char) = self.get_current_char() else {
            return result;
        };

        match current_char {
            ',' | '(' | ')' | ':' | '>' => {
                self.advance();
                result.push(current_char);
            }
            '"' => {
                current_char = self.enqueue(&mut result);
                // no escapes
                while current_char != '"' && self.get_current_char().is_some() {
                    current_char = self.enqueue(&mut result);
                }
                self.enqueue(&mut result);
            }
            '.' | '+' | '-' | '0'..='9' => {
                if current_char == '+' || current_char == '-' {
                    current_char = self.enqueue(&mut result);
                }
                while current_char.is_ascii_digit() {
                    current_char = self.enqueue(&mut result);
                }
                if current_char == '.' {
                    current_char = self.enqueue(&mut result);
                    while current_char.is_ascii_digit() {
                        current_char = self.enqueue(&mut result);
                    }
                }
                if current_char == 'e' || current_char == 'E' {
                    current_char = self.enqueue(&mut result);
                    if current_char == '+' || current_char == '-' {
                        current_char = self.enqueue(&mut result);
                    }
                    while current_char.is_ascii_digit() {
                        current_char = self.enqueue(&mut result);
                    }
                }
            }
            _ if current_char.is_alphabetic() => {
                while current_char.is_alphanumeric() || current_char == '_' {
                    current_char = self.enqueue(&mut result);
                }
            }
            _ => {
                // unknown symbol, returned alone so the caller reports it
                self.enqueue(&mut result);
            }
        }
        result
    }

    fn peek(&mut self) -> &str {
        // peek always look ahead and save the result to the buffer
        if self.buffer.is_empty() {
            self.buffer = self.pop();
        }
        &self.buffer
    }

    fn error<T>(&self, message: &str) -> ParserResult<T> {
        Err(ParserError::new(message, self.position))
    }

    fn parse_float(&mut self) -> ParserResult<f64> {
        let next_token = self.pop();
        match next_token.parse::<f64>() {
            Ok(num) if num.is_finite() => Ok(num),
            _ => self.error(&format!("cannot interpret '{}' as a number", next_token)),
        }
    }

    fn parse_positive(&mut self, what: &str) -> ParserResult<f64> {
        let value = self.parse_float()?;
        if value <= 0.0 {
            return self.error(&format!("{} must be positive, got {}", what, value));
        }
        Ok(value)
    }

    fn parse_index(&mut self) -> ParserResult<usize> {
        let next_token = self.pop();
        match next_token.parse::<usize>() {
            Ok(index) => Ok(index),
            Err(_) => self.error(&format!("expected an index, getting '{}'", next_token)),
        }
    }

    fn match_token(&mut self, expected_lexem: &str) -> ParserResult<()> {
        let next_lexem = self.pop();
        if next_lexem != expected_lexem {
            let message = format!(
                "expected '{}', getting '{}' instead",
                expected_lexem, next_lexem
            );
            self.error(&message)
        } else {
            Ok(())
        }
    }

    fn maybe_match(&mut self, expected_lexem: &str) -> bool {
        // if the expected lexem is the next in the stream, consume it and return true,
        // leave the stream untouched otherwise
        if self.peek() == expected_lexem {
            self.pop();
            return true;
        }
        false
    }

    fn parse_pair(&mut self) -> ParserResult<(f64, f64)> {
        self.match_token("(")?;
        let x = self.parse_float()?;
        self.match_token(",")?;
        let y = self.parse_float()?;
        self.match_token(")")?;
        Ok((x, y))
    }

    fn parse_screen_point(&mut self) -> ParserResult<ScreenPoint> {
        let (x, y) = self.parse_pair()?;
        Ok(ScreenPoint::new(x, y))
    }

    fn parse_vec3(&mut self) -> ParserResult<Vec3> {
        self.match_token("(")?;
        let x = self.parse_float()?;
        self.match_token(",")?;
        let y = self.parse_float()?;
        self.match_token(",")?;
        let z = self.parse_float()?;
        self.match_token(")")?;
        Ok(Vec3::new(x, y, z))
    }

    fn parse_string(&mut self) -> ParserResult<String> {
        let next_token = self.pop();
        match next_token
            .strip_prefix('"')
            .and_then(|token| token.strip_suffix('"'))
        {
            Some(content) => Ok(content.to_string()),
            None => self.error(&format!("expected a quoted string, getting {}", next_token)),
        }
    }

    fn parse_viewport(&mut self) -> ParserResult<Viewport> {
        self.match_token("viewport")?;
        let width = self.parse_positive("viewport width")?;
        let height = self.parse_positive("viewport height")?;
        Ok(Viewport::new(width, height))
    }

    fn parse_camera(&mut self) -> ParserResult<CameraDesc> {
        let mut camera = CameraDesc::default();
        if !self.maybe_match("camera") {
            return Ok(camera);
        }
        let mut has_target = false;
        loop {
            if self.maybe_match("from") {
                camera.from = self.parse_vec3()?;
            } else if self.maybe_match("to") {
                camera.to = self.parse_vec3()?;
                has_target = true;
            } else if self.maybe_match("fov") {
                camera.fov_degrees = self.parse_positive("fov")?;
            } else if self.maybe_match("near") {
                camera.near = self.parse_positive("near plane")?;
            } else if self.maybe_match("far") {
                camera.far = self.parse_positive("far plane")?;
            } else {
                break;
            }
        }
        if !has_target {
            camera.to = camera.from - Vec3::z_axis();
        }
        if camera.far <= camera.near {
            return self.error("far plane must be beyond the near plane");
        }
        Ok(camera)
    }

    fn parse_trasformation(&mut self) -> ParserResult<Mat4> {
        let mut trasform = Mat4::identity();
        while self.maybe_match(">") {
            let next_transform = if self.maybe_match("scale") {
                Mat4::scale(self.parse_positive("scale")?)
            } else if self.maybe_match("translate") {
                Mat4::translate(self.parse_vec3()?)
            } else if self.maybe_match("rotate") {
                let axis = self.parse_vec3()?;
                if axis.try_normalize().is_none() {
                    return self.error("rotation axis cannot be zero");
                }
                let angle = self.parse_float()?;
                Mat4::rotate(axis, angle.to_radians())
            } else {
                return self.error("unexpected token while parsing transform");
            };
            trasform = trasform.then(&next_transform);
        }
        Ok(trasform)
    }

    fn parse_plane(&mut self) -> ParserResult<PlaneAnchor> {
        self.match_token("plane")?;
        let extent_x = self.parse_positive("plane extent")?;
        let extent_z = self.parse_positive("plane extent")?;
        let transform = self.parse_trasformation()?;
        Ok(PlaneAnchor::new(transform, extent_x, extent_z))
    }

    fn parse_model(&mut self) -> ParserResult<ModelDesc> {
        self.match_token("model")?;
        let name = self.parse_string()?;
        let min = self.parse_vec3()?;
        let max = self.parse_vec3()?;
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return self.error("model bounds minimum exceeds maximum");
        }
        Ok(ModelDesc {
            name,
            bounds: Box3::from_min_max(min, max),
        })
    }

    fn parse_features_file(&mut self) -> ParserResult<FeatureCloud> {
        self.match_token("features")?;
        let path = self.parse_string()?;
        let path = match self.base_dir {
            Some(dir) => dir.join(path),
            None => path.into(),
        };
        FeatureCloud::load_obj(&path).or_else(|err| self.error(&err.to_string()))
    }

    fn parse_random(&mut self, rng: &mut StdRng) -> ParserResult<FeatureCloud> {
        self.match_token("random")?;
        let count = self.parse_index()?;
        let min = self.parse_vec3()?;
        let max = self.parse_vec3()?;
        Ok(FeatureCloud::random(rng, Box3::from_min_max(min, max), count))
    }

    fn parse_event(&mut self) -> ParserResult<Option<Event>> {
        let event = if self.maybe_match("tap") {
            Event::Tap(self.parse_screen_point()?)
        } else if self.maybe_match("toggle") {
            Event::Toggle(self.parse_index()?)
        } else if self.maybe_match("toggleall") {
            Event::ToggleAll
        } else if self.maybe_match("pinch") {
            Event::Pinch(self.parse_positive("pinch factor")?)
        } else if self.maybe_match("drag") {
            let index = self.parse_index()?;
            Event::Drag(index, self.parse_screen_point()?)
        } else {
            return Ok(None);
        };
        Ok(Some(event))
    }

    /// Parses a whole session script.
    pub fn parse_session(&mut self) -> ParserResult<Session> {
        let viewport = self.parse_viewport()?;
        let camera_desc = self.parse_camera()?;
        let camera = match CameraPose::look_at(
            camera_desc.from,
            camera_desc.to,
            camera_desc.fov_degrees.to_radians(),
            camera_desc.near,
            camera_desc.far,
            viewport,
        ) {
            Some(camera) => camera,
            None => return self.error("camera cannot look at its own position or straight up"),
        };

        let mut rng = StdRng::seed_from_u64(RANDOM_CLOUD_SEED);
        let mut cloud = FeatureCloud::default();
        let mut anchors = Vec::new();
        let mut model = ModelDesc::default();
        let mut events = Vec::new();
        while !self.is_empty() {
            if let Some(event) = self.parse_event()? {
                events.push(event);
                continue;
            }
            let next_token = self.peek().to_string();
            match next_token.as_str() {
                "feature" => {
                    self.pop();
                    let point = self.parse_vec3()?;
                    cloud.extend([point]);
                }
                "features" => {
                    let loaded = self.parse_features_file()?;
                    cloud.extend(loaded.points().iter().copied());
                }
                "random" => {
                    let generated = self.parse_random(&mut rng)?;
                    cloud.extend(generated.points().iter().copied());
                }
                "plane" => anchors.push(self.parse_plane()?),
                "model" => model = self.parse_model()?,
                _ => {
                    let message = format!("unexpected token '{}'", next_token);
                    return self.error(&message);
                }
            }
        }

        Ok(Session {
            camera,
            cloud,
            anchors,
            model,
            events,
        })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("camera", &self.camera.position())
            .field("features", &self.cloud.len())
            .field("anchors", &self.anchors.len())
            .field("model", &self.model.name)
            .field("events", &self.events.len())
            .finish()
    }
}
