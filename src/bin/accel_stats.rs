use raytracer_accel_lib::data_structures::bvh::Bvh;
use raytracer_accel_lib::data_structures::flatten::flatten_blas;
use raytracer_accel_lib::mesh::Mesh;
use raytracer_accel_lib::scene::Scene;
use raytracer_accel_lib::SplitMethod;

use std::ops::{AddAssign, DivAssign};
use std::time::{Duration, Instant};

use strum::IntoEnumIterator;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: accel <model.obj> [more.obj ...]");
        std::process::exit(2);
    }

    for path in &paths {
        let mesh = Mesh::from_obj(path)?;
        println!("{path}: {} triangles", mesh.triangle_count());
        for method in SplitMethod::iter() {
            run_blas(&mesh, method, 10).display(&format!("  blas, {method:?}"));
        }
        run_scene(&mesh, 16).display("  scene, 16 instances, Sah");
    }
    Ok(())
}

fn run_blas(mesh: &Mesh, method: SplitMethod, runs: u32) -> ConstructionTime {
    let mut total = ConstructionTime::default();
    for _ in 0..runs {
        let mut current = ConstructionTime::default();
        for submesh_idx in 0..mesh.submeshes().len() {
            let mut timer = Instant::now();
            let bvh = Bvh::new(mesh.bboxes(submesh_idx), method);
            current.build += timer.elapsed();

            timer = Instant::now();
            let mut nodes = vec![];
            let mut indices = vec![];
            flatten_blas(
                &bvh,
                &mesh.submeshes()[submesh_idx].triangles,
                0,
                |_| 0,
                &mut nodes,
                &mut indices,
            );
            current.flattening += timer.elapsed();
        }
        total += current;
    }
    total /= runs;
    total
}

fn run_scene(mesh: &Mesh, instances: u32) -> ConstructionTime {
    let mut scene = Scene::new(SplitMethod::Sah);
    for i in 0..instances {
        let offset = i as f32 * 2.0;
        scene
            .register_object(
                mesh.clone(),
                cgmath::Matrix4::from_translation(cgmath::Vector3::new(offset, 0.0, 0.0)),
            )
            .expect("instance registration failed");
    }
    let timer = Instant::now();
    scene.validate().expect("scene rebuild failed");
    ConstructionTime {
        build: timer.elapsed(),
        flattening: Duration::ZERO,
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct ConstructionTime {
    pub build: Duration,
    pub flattening: Duration,
}

impl ConstructionTime {
    pub fn total(&self) -> Duration {
        self.build + self.flattening
    }

    pub fn display(&self, text: &str) {
        println!("{}", text);
        println!("    build:      {:?}", self.build);
        println!("    flattening: {:?}", self.flattening);
        println!("    total:      {:?}", self.total());
    }
}

impl AddAssign<ConstructionTime> for ConstructionTime {
    fn add_assign(&mut self, rhs: Self) {
        self.build += rhs.build;
        self.flattening += rhs.flattening;
    }
}

impl DivAssign<u32> for ConstructionTime {
    fn div_assign(&mut self, rhs: u32) {
        self.build /= rhs;
        self.flattening /= rhs;
    }
}
