//! BSP tree, regions and zones

use super::FragmentLayout;
use super::object::{read_hashed_block, write_hashed_block};
use super::render::{FullRenderInfo, gated};
use crate::error::Result;
use crate::formats::wld::io::{FragmentReader, FragmentWriter};
use crate::formats::wld::name_table::NameRef;

/// One split plane of the world BSP tree.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldNode {
    /// Plane normal and distance.
    pub normal: [f32; 4],
    /// 1-based region index for leaves, 0 otherwise.
    pub region_ref: i32,
    pub front: i32,
    pub back: i32,
}

/// 0x21 - world BSP tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorldTree {
    pub name_ref: NameRef,
    pub nodes: Vec<WorldNode>,
}

impl FragmentLayout for WorldTree {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let count = r.u32("node_count")? as usize;
        let nodes = r.array(count, 28, "nodes", |r| {
            Ok(WorldNode {
                normal: r.vec4("normal")?,
                region_ref: r.i32("region_ref")?,
                front: r.i32("front")?,
                back: r.i32("back")?,
            })
        })?;
        Ok(Self { name_ref, nodes })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.count_u32(self.nodes.len(), "node_count")?;
        for node in &self.nodes {
            w.vec4(node.normal)?;
            w.i32(node.region_ref)?;
            w.i32(node.front)?;
            w.i32(node.back)?;
        }
        Ok(())
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// Renderable wall of a region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Wall {
    pub flags: u32,
    pub render: FullRenderInfo,
    pub normal: [f32; 4],
    pub vertex_indices: Vec<u32>,
}

/// Collision obstacle of a region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Obstacle {
    pub flags: u32,
    pub next_region: i32,
    pub kind: i32,
    pub vertex_indices: Vec<u32>,
    /// Present for kind -15.
    pub normal: Option<[f32; 4]>,
    /// Present for kind 18.
    pub edge_wall: Option<u32>,
    /// Present when obstacle flag 0x04 is set.
    pub user_data: Option<String>,
}

impl Obstacle {
    pub const KIND_NORMAL_ABC_D: i32 = -15;
    pub const KIND_EDGE_WALL: i32 = 18;
    pub const HAS_USER_DATA: u32 = 0x04;
}

/// Visibility tree node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VisNode {
    pub normal: [f32; 4],
    pub vislist_index: u32,
    pub front: u32,
    pub back: u32,
}

/// Encoded list of visible region ranges.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisList {
    pub ranges: Vec<u8>,
}

/// 0x22 - BSP region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Region {
    pub name_ref: NameRef,
    pub flags: u32,
    pub ambient_light_ref: i32,
    pub region_vertices: Vec<[f32; 3]>,
    pub proximal_regions: Vec<[f32; 2]>,
    pub render_vertices: Vec<[f32; 3]>,
    pub walls: Vec<Wall>,
    pub obstacles: Vec<Obstacle>,
    pub cutting_obstacle_count: u32,
    pub vis_nodes: Vec<VisNode>,
    pub vis_lists: Vec<VisList>,
    /// 0x01
    pub sphere: Option<[f32; 4]>,
    /// 0x02
    pub reverb_volume: Option<f32>,
    /// 0x04
    pub reverb_offset: Option<i32>,
    pub user_data: String,
    /// 0x100, ordinal of the region's mesh.
    pub mesh_ref: Option<i32>,
}

impl Region {
    pub const HAS_SPHERE: u32 = 0x01;
    pub const HAS_REVERB_VOLUME: u32 = 0x02;
    pub const HAS_REVERB_OFFSET: u32 = 0x04;
    /// Visibility lists are stored as bytes rather than 16-bit words.
    pub const BYTE_VIS_LISTS: u32 = 0x80;
    pub const HAS_MESH: u32 = 0x100;
}

fn read_wall(r: &mut FragmentReader<'_>) -> Result<Wall> {
    let flags = r.u32("wall_flags")?;
    let vertex_count = r.u32("wall_vertex_count")? as usize;
    let render = FullRenderInfo::read(r)?;
    let normal = r.vec4("wall_normal")?;
    let vertex_indices = r.u32_array(vertex_count, "wall_vertex_indices")?;
    Ok(Wall {
        flags,
        render,
        normal,
        vertex_indices,
    })
}

fn read_obstacle(r: &mut FragmentReader<'_>) -> Result<Obstacle> {
    let flags = r.u32("obstacle_flags")?;
    let next_region = r.i32("next_region")?;
    let kind = r.i32("obstacle_kind")?;
    let vertex_count = r.u32("obstacle_vertex_count")? as usize;
    let vertex_indices = r.u32_array(vertex_count, "obstacle_vertex_indices")?;
    let normal = if kind == Obstacle::KIND_NORMAL_ABC_D {
        Some(r.vec4("obstacle_normal")?)
    } else {
        None
    };
    let edge_wall = if kind == Obstacle::KIND_EDGE_WALL {
        Some(r.u32("edge_wall")?)
    } else {
        None
    };
    let user_data = gated(flags & Obstacle::HAS_USER_DATA, || r.string_u32("obstacle_user_data"))?;
    Ok(Obstacle {
        flags,
        next_region,
        kind,
        vertex_indices,
        normal,
        edge_wall,
        user_data,
    })
}

impl FragmentLayout for Region {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let ambient_light_ref = r.i32("ambient_light_ref")?;
        let region_vertex_count = r.u32("region_vertex_count")? as usize;
        let proximal_count = r.u32("proximal_region_count")? as usize;
        let render_vertex_count = r.u32("render_vertex_count")? as usize;
        let wall_count = r.u32("wall_count")? as usize;
        let obstacle_count = r.u32("obstacle_count")? as usize;
        let cutting_obstacle_count = r.u32("cutting_obstacle_count")?;
        let vis_node_count = r.u32("vis_node_count")? as usize;
        let vis_list_count = r.u32("vis_list_count")? as usize;

        let region_vertices = r.vec3_array(region_vertex_count, "region_vertices")?;
        let proximal_regions = r.array(proximal_count, 8, "proximal_regions", |r| r.vec2("proximal_regions"))?;
        let render_vertices = r.vec3_array(render_vertex_count, "render_vertices")?;
        let walls = r.array(wall_count, 88, "walls", read_wall)?;
        let obstacles = r.array(obstacle_count, 16, "obstacles", read_obstacle)?;
        let vis_nodes = r.array(vis_node_count, 28, "vis_nodes", |r| {
            Ok(VisNode {
                normal: r.vec4("vis_node_normal")?,
                vislist_index: r.u32("vislist_index")?,
                front: r.u32("vis_node_front")?,
                back: r.u32("vis_node_back")?,
            })
        })?;
        let vis_lists = r.array(vis_list_count, 2, "vis_lists", |r| {
            let count = r.u16("vis_list_range_count")? as usize;
            let len = if flags & Self::BYTE_VIS_LISTS != 0 {
                count
            } else {
                count * 2
            };
            Ok(VisList {
                ranges: r.bytes(len, "vis_list_ranges")?,
            })
        })?;

        let sphere = gated(flags & Self::HAS_SPHERE, || r.vec4("sphere"))?;
        let reverb_volume = gated(flags & Self::HAS_REVERB_VOLUME, || r.f32("reverb_volume"))?;
        let reverb_offset = gated(flags & Self::HAS_REVERB_OFFSET, || r.i32("reverb_offset"))?;
        let user_data = r.string_u32("user_data")?;
        let mesh_ref = gated(flags & Self::HAS_MESH, || r.i32("mesh_ref"))?;

        Ok(Self {
            name_ref,
            flags,
            ambient_light_ref,
            region_vertices,
            proximal_regions,
            render_vertices,
            walls,
            obstacles,
            cutting_obstacle_count,
            vis_nodes,
            vis_lists,
            sphere,
            reverb_volume,
            reverb_offset,
            user_data,
            mesh_ref,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.i32(self.ambient_light_ref)?;
        w.count_u32(self.region_vertices.len(), "region_vertex_count")?;
        w.count_u32(self.proximal_regions.len(), "proximal_region_count")?;
        w.count_u32(self.render_vertices.len(), "render_vertex_count")?;
        w.count_u32(self.walls.len(), "wall_count")?;
        w.count_u32(self.obstacles.len(), "obstacle_count")?;
        w.u32(self.cutting_obstacle_count)?;
        w.count_u32(self.vis_nodes.len(), "vis_node_count")?;
        w.count_u32(self.vis_lists.len(), "vis_list_count")?;

        w.vec3_array(&self.region_vertices)?;
        self.proximal_regions.iter().try_for_each(|&p| w.vec2(p))?;
        w.vec3_array(&self.render_vertices)?;

        for wall in &self.walls {
            w.u32(wall.flags)?;
            w.count_u32(wall.vertex_indices.len(), "wall_vertex_count")?;
            wall.render.write(w)?;
            w.vec4(wall.normal)?;
            w.u32_array(&wall.vertex_indices)?;
        }

        for obstacle in &self.obstacles {
            w.u32(obstacle.flags)?;
            w.i32(obstacle.next_region)?;
            w.i32(obstacle.kind)?;
            w.count_u32(obstacle.vertex_indices.len(), "obstacle_vertex_count")?;
            w.u32_array(&obstacle.vertex_indices)?;
            if obstacle.kind == Obstacle::KIND_NORMAL_ABC_D {
                w.vec4(*w.section(&obstacle.normal, "obstacle_normal")?)?;
            }
            if obstacle.kind == Obstacle::KIND_EDGE_WALL {
                w.u32(*w.section(&obstacle.edge_wall, "edge_wall")?)?;
            }
            if obstacle.flags & Obstacle::HAS_USER_DATA != 0 {
                let data = w.section(&obstacle.user_data, "obstacle_user_data")?;
                w.string_u32(data, "obstacle_user_data")?;
            }
        }

        for node in &self.vis_nodes {
            w.vec4(node.normal)?;
            w.u32(node.vislist_index)?;
            w.u32(node.front)?;
            w.u32(node.back)?;
        }

        for list in &self.vis_lists {
            let len = list.ranges.len();
            if self.flags & Self::BYTE_VIS_LISTS != 0 {
                w.count_u16(len, "vis_list_range_count")?;
            } else {
                if len % 2 != 0 {
                    return Err(w.overflow("vis_list_ranges", len));
                }
                w.count_u16(len / 2, "vis_list_range_count")?;
            }
            w.bytes(&list.ranges)?;
        }

        if self.flags & Self::HAS_SPHERE != 0 {
            w.vec4(*w.section(&self.sphere, "sphere")?)?;
        }
        if self.flags & Self::HAS_REVERB_VOLUME != 0 {
            w.f32(*w.section(&self.reverb_volume, "reverb_volume")?)?;
        }
        if self.flags & Self::HAS_REVERB_OFFSET != 0 {
            w.i32(*w.section(&self.reverb_offset, "reverb_offset")?)?;
        }
        w.string_u32(&self.user_data, "user_data")?;
        if self.flags & Self::HAS_MESH != 0 {
            w.i32(*w.section(&self.mesh_ref, "mesh_ref")?)?;
        }
        w.pad_to_4()
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x29 - named group of regions (water, lava, zone lines).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Zone {
    pub name_ref: NameRef,
    pub flags: u32,
    /// Region indices.
    pub regions: Vec<u32>,
    /// Decoded (un-hashed) user data, when the record carries the block.
    pub user_data: Option<Vec<u8>>,
}

impl FragmentLayout for Zone {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let count = r.u32("region_count")? as usize;
        let regions = r.u32_array(count, "regions")?;
        let user_data = read_hashed_block(r, "user_data")?;
        Ok(Self {
            name_ref,
            flags,
            regions,
            user_data,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.count_u32(self.regions.len(), "region_count")?;
        w.u32_array(&self.regions)?;
        write_hashed_block(w, self.user_data.as_ref(), "user_data")
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}
