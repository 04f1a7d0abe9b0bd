//! Perspective orbit camera projecting world positions onto the canvas.

use glam::Vec3;

use crate::racer::Player;

const NEAR: f32 = 1.0;
const ORBIT_SPEED: f32 = 0.005;
const MAX_PITCH: f32 = 1.4;
const CHASE_DISTANCE: f32 = 60.0;
const CHASE_PITCH: f32 = 0.3;

/// A world position as seen on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
	pub x: f64,
	pub y: f64,
	/// Pixels per world unit at this depth.
	pub scale: f64,
	/// Distance along the view direction.
	pub depth: f32,
}

#[derive(Clone, Debug)]
pub struct Camera {
	pub target: Vec3,
	pub yaw: f32,
	pub pitch: f32,
	pub distance: f32,
	/// Focal length in pixels.
	pub focal: f32,
}

impl Default for Camera {
	fn default() -> Self {
		Self {
			target: Vec3::new(0.0, -150.0, -60.0),
			yaw: 0.0,
			pitch: 0.25,
			distance: 600.0,
			focal: 700.0,
		}
	}
}

impl Camera {
	pub fn eye(&self) -> Vec3 {
		let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
		let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
		self.target
			+ Vec3::new(sin_yaw * cos_pitch, sin_pitch, cos_yaw * cos_pitch) * self.distance
	}

	/// Right, up and forward unit vectors.
	fn basis(&self) -> (Vec3, Vec3, Vec3) {
		let forward = (self.target - self.eye()).normalize();
		let right = forward.cross(Vec3::Y).normalize();
		let up = right.cross(forward);
		(right, up, forward)
	}

	/// `None` for points behind the near plane.
	pub fn project(&self, point: Vec3, width: f64, height: f64) -> Option<Projected> {
		let (right, up, forward) = self.basis();
		let rel = point - self.eye();
		let depth = rel.dot(forward);
		if depth < NEAR {
			return None;
		}
		let scale = (self.focal / depth) as f64;
		Some(Projected {
			x: width / 2.0 + rel.dot(right) as f64 * scale,
			y: height / 2.0 - rel.dot(up) as f64 * scale,
			scale,
			depth,
		})
	}

	/// World offset that moves a point at `depth` by (`dx`, `dy`) pixels.
	pub fn screen_to_world(&self, dx: f64, dy: f64, depth: f32) -> Vec3 {
		let (right, up, _) = self.basis();
		let per_pixel = depth / self.focal;
		(right * dx as f32 - up * dy as f32) * per_pixel
	}

	pub fn orbit(&mut self, dx: f64, dy: f64) {
		self.yaw -= dx as f32 * ORBIT_SPEED;
		self.pitch = (self.pitch + dy as f32 * ORBIT_SPEED).clamp(-MAX_PITCH, MAX_PITCH);
	}

	pub fn zoom(&mut self, factor: f32) {
		self.distance = (self.distance * factor).clamp(50.0, 5000.0);
	}

	/// Sits behind and above the player, looking where it is heading.
	pub fn follow(&mut self, player: &Player) {
		self.target = player.position;
		self.yaw = player.heading;
		self.pitch = CHASE_PITCH;
		self.distance = CHASE_DISTANCE;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const W: f64 = 800.0;
	const H: f64 = 600.0;

	#[test]
	fn target_projects_to_the_center() {
		let camera = Camera::default();
		let p = camera.project(camera.target, W, H).unwrap();
		assert!((p.x - W / 2.0).abs() < 1e-3);
		assert!((p.y - H / 2.0).abs() < 1e-3);
		assert!((p.depth - camera.distance).abs() < 1e-2);
	}

	#[test]
	fn points_behind_the_eye_are_culled() {
		let camera = Camera::default();
		let behind = camera.eye() + (camera.eye() - camera.target);
		assert!(camera.project(behind, W, H).is_none());
	}

	#[test]
	fn screen_offsets_map_back_to_the_same_depth() {
		let mut camera = Camera::default();
		camera.orbit(120.0, -40.0);
		let point = Vec3::new(30.0, -200.0, -80.0);
		let before = camera.project(point, W, H).unwrap();
		let moved = point + camera.screen_to_world(25.0, -10.0, before.depth);
		let after = camera.project(moved, W, H).unwrap();
		assert!((after.x - before.x - 25.0).abs() < 1e-2);
		assert!((after.y - before.y + 10.0).abs() < 1e-2);
	}

	#[test]
	fn chase_camera_looks_along_the_heading() {
		let mut camera = Camera::default();
		let player = Player {
			position: Vec3::new(10.0, -295.0, -120.0),
			speed: 1.0,
			heading: 0.7,
		};
		camera.follow(&player);
		let ahead = player.position + player.direction() * 50.0;
		let p = camera.project(ahead, W, H).unwrap();
		assert!((p.x - W / 2.0).abs() < 1e-2);
		assert!(p.depth > camera.distance);
	}

	#[test]
	fn pitch_and_zoom_are_clamped() {
		let mut camera = Camera::default();
		camera.orbit(0.0, 1e6);
		assert_eq!(camera.pitch, MAX_PITCH);
		camera.zoom(1e-6);
		assert_eq!(camera.distance, 50.0);
	}
}
