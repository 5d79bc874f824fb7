use glam::Mat4;

use crate::{
    material::{GpuMaterial, MaterialData},
    mesh::{GpuGeometry, MeshData, MeshInstance},
    shaders::{MATERIAL_GROUP, MODEL_GROUP},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GeometryId(usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MaterialId(usize);

struct SceneObject {
    geometry: GeometryId,
    material: MaterialId,
    instance: MeshInstance,
}

/// Uploaded meshes and materials plus the objects that place them.
///
/// Both render paths draw it the same way: model group and material group per
/// object, then one indexed draw.
pub struct Scene {
    model_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    geometries: Vec<GpuGeometry>,
    materials: Vec<GpuMaterial>,
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            model_layout: MeshInstance::create_layout(device),
            material_layout: GpuMaterial::create_layout(device),
            geometries: Vec::new(),
            materials: Vec::new(),
            objects: Vec::new(),
        }
    }

    pub fn model_layout(&self) -> &wgpu::BindGroupLayout {
        &self.model_layout
    }

    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    pub fn add_geometry(&mut self, device: &wgpu::Device, data: &MeshData) -> GeometryId {
        self.geometries.push(GpuGeometry::new(device, data));
        GeometryId(self.geometries.len() - 1)
    }

    pub fn add_material(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &MaterialData,
    ) -> MaterialId {
        self.materials
            .push(GpuMaterial::new(device, queue, &self.material_layout, data));
        MaterialId(self.materials.len() - 1)
    }

    pub fn add_object(
        &mut self,
        device: &wgpu::Device,
        geometry: GeometryId,
        material: MaterialId,
        model: Mat4,
    ) {
        let instance = MeshInstance::new(device, &self.model_layout, model);
        self.objects.push(SceneObject {
            geometry,
            material,
            instance,
        });
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Issues one draw per object. The caller has bound the pipeline and the scene group.
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        let mut bound_material = None;
        for object in &self.objects {
            if bound_material != Some(object.material) {
                let material = &self.materials[object.material.0];
                render_pass.set_bind_group(MATERIAL_GROUP, &material.bind_group, &[]);
                bound_material = Some(object.material);
            }

            let geometry = &self.geometries[object.geometry.0];
            render_pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
            render_pass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            render_pass.set_bind_group(MODEL_GROUP, &object.instance.bind_group, &[]);
            render_pass.draw_indexed(0..geometry.index_count, 0, 0..1);
        }
    }
}
