pub mod detection;
pub mod face_detector;
pub mod non_max_suppressor;
pub mod unique_face_tracker;
