use std::ops::{Add, Div, Index, IndexMut, Mul, Sub};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Default, bytemuck::Zeroable)]
pub struct Vec3<T>(pub T, pub T, pub T);

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Default, bytemuck::Zeroable)]
pub struct Vec4<T>(pub T, pub T, pub T, pub T);

unsafe impl<T> bytemuck::Pod for Vec3<T> where T: bytemuck::Pod {}
unsafe impl<T> bytemuck::Pod for Vec4<T> where T: bytemuck::Pod {}

pub type Vec3f32 = Vec3<f32>;
pub type Vec3u32 = Vec3<u32>;
pub type Vec4f32 = Vec4<f32>;

#[inline(always)]
pub const fn vec3f(f0: f32, f1: f32, f2: f32) -> Vec3<f32> {
    Vec3::<f32>(f0, f1, f2)
}

#[inline(always)]
pub const fn vec4f(f0: f32, f1: f32, f2: f32, f3: f32) -> Vec4<f32> {
    Vec4::<f32>(f0, f1, f2, f3)
}

#[inline(always)]
pub const fn vec3u32(u0: u32, u1: u32, u2: u32) -> Vec3<u32> {
    Vec3::<u32>(u0, u1, u2)
}

/// Vec3 Methods
///

impl Vec3<f32> {
    /// Component-wise minimum
    pub fn min(self, rhs: Self) -> Self {
        Self(
            f32::min(self.0, rhs.0),
            f32::min(self.1, rhs.1),
            f32::min(self.2, rhs.2),
        )
    }

    /// Component-wise maximum
    pub fn max(self, rhs: Self) -> Self {
        Self(
            f32::max(self.0, rhs.0),
            f32::max(self.1, rhs.1),
            f32::max(self.2, rhs.2),
        )
    }
}

impl<T> Vec3<T>
where
    T: Default,
{
    pub fn vec4(self) -> Vec4<T> {
        Vec4::<T>(self.0, self.1, self.2, Default::default())
    }
}

impl<T> Add<Vec3<T>> for Vec3<T>
where
    T: Add<Output = T>,
{
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

impl<T> Sub<Vec3<T>> for Vec3<T>
where
    T: Sub<Output = T>,
{
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0, self.1 - rhs.1, self.2 - rhs.2)
    }
}

impl<T> Mul<T> for Vec3<T>
where
    T: Mul<Output = T> + Copy,
{
    type Output = Self;

    fn mul(self, rhs: T) -> Self::Output {
        Self(self.0 * rhs, self.1 * rhs, self.2 * rhs)
    }
}

impl<T> Div<T> for Vec3<T>
where
    T: Div<Output = T> + Copy,
{
    type Output = Self;

    fn div(self, rhs: T) -> Self::Output {
        Self(self.0 / rhs, self.1 / rhs, self.2 / rhs)
    }
}

impl<T> Index<u32> for Vec3<T> {
    type Output = T;

    fn index(&self, index: u32) -> &Self::Output {
        match index {
            0 => &self.0,
            1 => &self.1,
            2 => &self.2,
            _ => panic!("Unexpected index {index}"),
        }
    }
}

impl<T> IndexMut<u32> for Vec3<T> {
    fn index_mut(&mut self, index: u32) -> &mut Self::Output {
        match index {
            0 => &mut self.0,
            1 => &mut self.1,
            2 => &mut self.2,
            _ => panic!("Unexpected index {index}"),
        }
    }
}

impl<T> From<(T, T, T)> for Vec3<T> {
    fn from(value: (T, T, T)) -> Self {
        Vec3::<T>(value.0, value.1, value.2)
    }
}

impl<T> From<[T; 3]> for Vec3<T>
where
    T: Copy,
{
    fn from(value: [T; 3]) -> Self {
        Self(value[0], value[1], value[2])
    }
}

impl From<Vec3<f32>> for cgmath::Vector3<f32> {
    fn from(value: Vec3<f32>) -> Self {
        cgmath::Vector3::new(value.0, value.1, value.2)
    }
}

impl From<cgmath::Vector3<f32>> for Vec3<f32> {
    fn from(value: cgmath::Vector3<f32>) -> Self {
        Self(value.x, value.y, value.z)
    }
}

/// Vec4 Methods
///

impl<T> Vec4<T>
where
    T: Copy,
{
    pub fn xyz(&self) -> Vec3<T> {
        Vec3::<T>(self.0, self.1, self.2)
    }
}

impl<T> Index<u32> for Vec4<T> {
    type Output = T;

    fn index(&self, index: u32) -> &Self::Output {
        match index {
            0 => &self.0,
            1 => &self.1,
            2 => &self.2,
            3 => &self.3,
            _ => panic!("Unexpected index {index}"),
        }
    }
}

impl<T> From<(T, T, T, T)> for Vec4<T> {
    fn from(value: (T, T, T, T)) -> Self {
        Self(value.0, value.1, value.2, value.3)
    }
}

impl<T> From<[T; 4]> for Vec4<T>
where
    T: Copy,
{
    fn from(value: [T; 4]) -> Self {
        Self(value[0], value[1], value[2], value[3])
    }
}
