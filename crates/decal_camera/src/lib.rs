use bevy::{
    input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel},
    prelude::*,
};

pub struct OrbitCameraPlugin;

impl Plugin for OrbitCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, orbit_camera_system.in_set(OrbitCameraSystems));
    }
}

/// Systems that read input and move orbit cameras. Anything that toggles
/// [`OrbitCameraSettings::enabled`] for the current gesture should run before this.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrbitCameraSystems;

/// Orbit-camera controls placed on the camera entity.
///
/// Controls:
/// - Left-click + drag: orbit around `focus`
/// - Scroll wheel: zoom towards / away from `focus`
#[derive(Component, Clone, Debug)]
pub struct OrbitCameraSettings {
    pub focus: Vec3,
    pub radius: f32,
    /// Rotation around world Y, radians.
    pub yaw: f32,
    /// Elevation above the focus plane, radians.
    pub pitch: f32,
    /// Radians per pixel of mouse motion.
    pub sensitivity: f32,
    /// Fraction of the radius per scroll line.
    pub zoom_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Whether the controls respond to input. Manipulation tools turn this
    /// off for the duration of their gesture.
    pub enabled: bool,
}

impl Default for OrbitCameraSettings {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            radius: 5.0,
            yaw: 0.0,
            pitch: 0.3,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            min_radius: 0.5,
            max_radius: 50.0,
            enabled: true,
        }
    }
}

impl OrbitCameraSettings {
    /// Camera transform for the current focus, angles and radius.
    pub fn transform(&self) -> Transform {
        let rotation = Quat::from_euler(EulerRot::YXZ, self.yaw, -self.pitch, 0.0);
        let translation = self.focus + rotation * Vec3::Z * self.radius;
        Transform::from_translation(translation).looking_at(self.focus, Vec3::Y)
    }

    fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * self.sensitivity;
        self.pitch = (self.pitch + delta.y * self.sensitivity).clamp(
            -std::f32::consts::FRAC_PI_2 + 0.01,
            std::f32::consts::FRAC_PI_2 - 0.01,
        );
    }

    fn zoom(&mut self, lines: f32) {
        self.radius =
            (self.radius * (1.0 - lines * self.zoom_speed)).clamp(self.min_radius, self.max_radius);
    }
}

fn orbit_camera_system(
    mouse: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut scroll_events: MessageReader<MouseWheel>,
    mut camera_query: Query<(&mut OrbitCameraSettings, &mut Transform)>,
) {
    let mut mouse_delta = Vec2::ZERO;
    for motion in mouse_motion.read() {
        mouse_delta += motion.delta;
    }
    let mut scroll = 0.0;
    for event in scroll_events.read() {
        scroll += match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y * 0.01,
        };
    }

    for (mut settings, mut transform) in &mut camera_query {
        if !settings.enabled {
            continue;
        }

        if mouse.pressed(MouseButton::Left) && mouse_delta != Vec2::ZERO {
            settings.orbit(mouse_delta);
        }
        if scroll != 0.0 {
            settings.zoom(scroll);
        }

        let target = settings.transform();
        if *transform != target {
            *transform = target;
        }
    }
}
