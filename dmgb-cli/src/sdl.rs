use dmgb_core::{
    shade_to_gray, Button, FrameBuffer, Frontend, FrontendAction, InputConfig, JoypadState,
    SCREEN_HEIGHT, SCREEN_WIDTH,
};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::render::{Texture, TextureCreator, TextureValueError, WindowCanvas};
use sdl2::video::{WindowBuildError, WindowContext};
use sdl2::{EventPump, IntegerOrSdlError, Sdl};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdlError {
    #[error("SDL2 error: {msg}")]
    Generic { msg: String },
    #[error("error building SDL2 window: {source}")]
    WindowBuild {
        #[from]
        source: WindowBuildError,
    },
    #[error("error building SDL2 renderer: {source}")]
    RendererBuild {
        #[from]
        source: IntegerOrSdlError,
    },
    #[error("error creating SDL2 texture: {source}")]
    TextureCreation {
        #[from]
        source: TextureValueError,
    },
    #[error("invalid key name for {button}: '{key_name}'")]
    InvalidKeycode { button: Button, key_name: String },
    #[error("duplicate key binding: '{key_name}'")]
    DuplicateKeycode { key_name: String },
    #[error("error rendering frame: {msg}")]
    Render { msg: String },
}

impl From<String> for SdlError {
    fn from(value: String) -> Self {
        Self::Generic { msg: value }
    }
}

fn build_key_map(input_config: &InputConfig) -> Result<HashMap<Keycode, Button>, SdlError> {
    let mut key_map = HashMap::new();
    for button in Button::ALL {
        let key_name = input_config.key_name(button);
        let keycode = Keycode::from_name(key_name).ok_or_else(|| SdlError::InvalidKeycode {
            button,
            key_name: key_name.into(),
        })?;

        if key_map.insert(keycode, button).is_some() {
            return Err(SdlError::DuplicateKeycode {
                key_name: keycode.name(),
            });
        }
    }

    Ok(key_map)
}

/// Owns the SDL context, window and event pump for the lifetime of the program.
pub struct SdlContext {
    _sdl: Sdl,
    canvas: WindowCanvas,
    texture_creator: TextureCreator<WindowContext>,
    event_pump: EventPump,
}

impl SdlContext {
    pub fn new(window_title: &str, scale: u32, vsync: bool) -> Result<Self, SdlError> {
        let sdl = sdl2::init()?;
        let video = sdl.video()?;

        let window = video
            .window(
                window_title,
                SCREEN_WIDTH as u32 * scale,
                SCREEN_HEIGHT as u32 * scale,
            )
            .position_centered()
            .resizable()
            .build()?;

        let mut canvas_builder = window.into_canvas();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let mut canvas = canvas_builder.build()?;
        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();
        canvas.present();

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl.event_pump()?;

        Ok(Self {
            _sdl: sdl,
            canvas,
            texture_creator,
            event_pump,
        })
    }

    pub fn frontend(&mut self, input_config: &InputConfig) -> Result<SdlFrontend<'_>, SdlError> {
        let key_map = build_key_map(input_config)?;

        let Self {
            canvas,
            texture_creator,
            event_pump,
            ..
        } = self;

        let texture = texture_creator.create_texture_streaming(
            PixelFormatEnum::RGB24,
            SCREEN_WIDTH as u32,
            SCREEN_HEIGHT as u32,
        )?;

        Ok(SdlFrontend {
            canvas,
            texture,
            event_pump,
            key_map,
        })
    }
}

pub struct SdlFrontend<'a> {
    canvas: &'a mut WindowCanvas,
    texture: Texture<'a>,
    event_pump: &'a mut EventPump,
    key_map: HashMap<Keycode, Button>,
}

impl Frontend for SdlFrontend<'_> {
    type Error = SdlError;

    fn poll_events(&mut self, joypad_state: &mut JoypadState) -> FrontendAction {
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => {
                    return FrontendAction::Quit;
                }
                Event::KeyDown {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(&button) = self.key_map.get(&keycode) {
                        joypad_state.set(button, true);
                    }
                }
                Event::KeyUp {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(&button) = self.key_map.get(&keycode) {
                        joypad_state.set(button, false);
                    }
                }
                _ => {}
            }
        }

        FrontendAction::Continue
    }

    fn render_frame(&mut self, frame_buffer: &FrameBuffer) -> Result<(), Self::Error> {
        self.canvas.clear();
        self.texture
            .with_lock(None, |pixels, pitch| {
                for (i, row) in frame_buffer.iter().enumerate() {
                    for (j, &shade) in row.iter().enumerate() {
                        let gray = shade_to_gray(shade);
                        let start = i * pitch + j * 3;
                        pixels[start..start + 3].fill(gray);
                    }
                }
            })
            .map_err(|msg| SdlError::Render { msg })?;
        self.canvas
            .copy(&self.texture, None, None)
            .map_err(|msg| SdlError::Render { msg })?;
        self.canvas.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_key_map() {
        let key_map = build_key_map(&InputConfig::default()).unwrap();

        assert_eq!(Some(&Button::A), key_map.get(&Keycode::Z));
        assert_eq!(Some(&Button::Start), key_map.get(&Keycode::Return));
        assert_eq!(Some(&Button::Select), key_map.get(&Keycode::RShift));
        assert_eq!(8, key_map.len());
    }

    #[test]
    fn invalid_and_duplicate_keys() {
        let mut input_config = InputConfig::default();
        input_config.set_key_name(Button::B, "NotAKey");
        assert!(matches!(
            build_key_map(&input_config),
            Err(SdlError::InvalidKeycode {
                button: Button::B,
                ..
            })
        ));

        let mut input_config = InputConfig::default();
        input_config.set_key_name(Button::B, "Z");
        assert!(matches!(
            build_key_map(&input_config),
            Err(SdlError::DuplicateKeycode { .. })
        ));
    }
}
