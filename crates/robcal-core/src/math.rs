use nalgebra::{Isometry3, Matrix3, Matrix3x4, Matrix4, Vector3};

pub type Real = f64;

pub type Vec3 = Vector3<Real>;
pub type Mat3 = Matrix3<Real>;
pub type Mat34 = Matrix3x4<Real>;
pub type Mat4 = Matrix4<Real>;
pub type Iso3 = Isometry3<Real>;
