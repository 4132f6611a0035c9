//! Camera types, orbit controller and uniforms for view/projection.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use winit::event::{MouseScrollDelta, WindowEvent};

/// Conversion matrix: wgpu clip space z is 0..1 while cgmath produces OpenGL's -1..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    /// Place the camera at `position` oriented towards `target`.
    pub fn look_at(position: Point3<f32>, target: Point3<f32>) -> Self {
        let dir = (target - position).normalize();
        Self {
            position,
            yaw: Rad(dir.z.atan2(dir.x)),
            pitch: Rad(dir.y.asin()),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();

        Matrix4::look_to_rh(
            self.position,
            Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize(),
            Vector3::unit_y(),
        )
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::from_scale(1.0).into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Interactive orbit control around a fixed target point.
///
/// Mouse drags accumulate angular velocity which decays by the damping
/// factor each update, approximating the inertial feel of typical orbit
/// controls. The polar angle and the orbit distance are clamped to the
/// configured bounds on every update.
#[derive(Debug)]
pub struct OrbitController {
    target: Point3<f32>,
    distance: f32,
    azimuth: Rad<f32>,
    // angle from the +Y axis; 0 is straight above the target
    polar: Rad<f32>,
    azimuth_velocity: f32,
    polar_velocity: f32,
    zoom_velocity: f32,
    pub max_polar: Rad<f32>,
    pub min_distance: f32,
    pub max_distance: f32,
    pub damping: f32,
    rotate_speed: f32,
    zoom_speed: f32,
}

impl OrbitController {
    const MIN_POLAR: f32 = 0.01;

    pub fn new(
        target: Point3<f32>,
        position: Point3<f32>,
        max_polar: Rad<f32>,
        min_distance: f32,
        max_distance: f32,
        damping: f32,
    ) -> Self {
        let offset = position - target;
        let distance = offset.magnitude().max(min_distance);
        let azimuth = Rad(offset.z.atan2(offset.x));
        let polar = Rad((offset.y / distance).clamp(-1.0, 1.0).acos());
        Self {
            target,
            distance,
            azimuth,
            polar,
            azimuth_velocity: 0.0,
            polar_velocity: 0.0,
            zoom_velocity: 0.0,
            max_polar,
            min_distance,
            max_distance,
            damping,
            rotate_speed: 0.005,
            zoom_speed: 0.25,
        }
    }

    /// Accumulate a mouse drag into angular velocity.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.azimuth_velocity += dx as f32 * self.rotate_speed;
        self.polar_velocity -= dy as f32 * self.rotate_speed;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            let amount = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 60.0,
            };
            self.zoom_velocity -= amount * self.zoom_speed;
        }
    }

    /// Apply accumulated input and damping, then write the resulting orbit
    /// position and orientation into `camera`.
    pub fn update(&mut self, camera: &mut Camera, _dt: Duration) {
        self.azimuth += Rad(self.azimuth_velocity);
        self.polar += Rad(self.polar_velocity);
        self.distance += self.zoom_velocity;

        // Velocity decay, applied per frame like the usual damping factor.
        let decay = 1.0 - self.damping;
        self.azimuth_velocity *= decay;
        self.polar_velocity *= decay;
        self.zoom_velocity *= decay;

        self.polar = Rad(self.polar.0.clamp(Self::MIN_POLAR, self.max_polar.0));
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);

        let (sin_polar, cos_polar) = self.polar.0.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.0.sin_cos();
        let offset = Vector3::new(
            self.distance * sin_polar * cos_azimuth,
            self.distance * cos_polar,
            self.distance * sin_polar * sin_azimuth,
        );
        let position = self.target + offset;

        let dir = (self.target - position).normalize();
        camera.position = position;
        camera.yaw = Rad(dir.z.atan2(dir.x));
        camera.pitch = Rad(dir.y.asin());
    }
}

/// Camera GPU resources bundled with the camera and its controller.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Deg;

    #[test]
    fn polar_angle_is_clamped() {
        let mut controller = OrbitController::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 5.0),
            Rad(std::f32::consts::FRAC_PI_2),
            1.0,
            10.0,
            0.02,
        );
        let mut camera = Camera::new((0.0, 0.0, 5.0), Deg(-90.0), Deg(0.0));
        // drag hard downwards, which would push the camera below the target
        for _ in 0..100 {
            controller.handle_mouse(0.0, -500.0);
            controller.update(&mut camera, Duration::from_millis(16));
        }
        assert!(controller.polar.0 <= std::f32::consts::FRAC_PI_2 + 1e-5);
        assert!(camera.position.y >= -1e-4);
    }

    #[test]
    fn distance_is_clamped() {
        let mut controller = OrbitController::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 5.0),
            Rad(std::f32::consts::FRAC_PI_2),
            1.0,
            10.0,
            0.02,
        );
        let mut camera = Camera::new((0.0, 0.0, 5.0), Deg(-90.0), Deg(0.0));
        for _ in 0..200 {
            controller.zoom_velocity += 5.0;
            controller.update(&mut camera, Duration::from_millis(16));
        }
        assert!(controller.distance <= 10.0);
    }
}
