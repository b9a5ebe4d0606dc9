pub mod animation;
pub mod assets;
pub mod entity;
pub mod game;
pub mod input;
pub mod player;
pub mod renderable;
pub mod scene;
pub mod sprite;
pub mod surface;
pub mod time;
pub mod timer;
pub mod widgets;

pub use animation::{Animation, AnimationDef};
pub use assets::{AssetLoader, ImageHandle, ImageState};
pub use entity::{Direction, Entity};
pub use game::{Game, HudSink, NullHud, HP_BAR, MANA_BAR};
pub use input::{InputManager, Key, KeySnapshot, Subscription};
pub use player::{PlayerData, PlayerDataPatch};
pub use renderable::{Renderable, RenderingSystem};
pub use scene::{Scene, SceneContext, SceneRequest};
pub use sprite::SpriteSheet;
pub use surface::{
    Color, DrawCommand, Rect, RecordingSurface, RenderSurface, BASE_HEIGHT, BASE_WIDTH,
};
pub use time::{FrameHandler, FrameScheduler, FrameStats, FrameToken, GameLoop, MAX_DELTA};
pub use timer::{TimerId, TimerQueue};
pub use widgets::{ChoiceList, ContinuePrompt, DialogueCursor, OneShot, PressSettle};
