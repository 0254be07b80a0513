pub mod mjpeg_camera;
pub mod still_image;
