//! Integration tests for hierarchical transform propagation

use approx::assert_relative_eq;
use deferred_engine::foundation::math::{Mat4, Mat4Ext, Quat, Vec3};
use deferred_engine::scene::{NodeType, SceneError, SceneGraph, Transform};

fn local_transform(step: usize) -> Transform {
    let step = step as f32;
    Transform::from_parts(
        Vec3::new(step, 0.5 * step, -1.0),
        Quat::from_euler_angles(0.1 * step, 0.2, -0.05 * step),
        Vec3::repeat(1.0 + 0.1 * step),
    )
}

fn build_chain(graph: &mut SceneGraph, depth: usize) -> Vec<deferred_engine::foundation::collections::NodeId> {
    let mut chain = Vec::new();
    for step in 0..depth {
        let node = graph.create_node(NodeType::Basic);
        graph.node_mut(node).unwrap().set_transform(local_transform(step));
        if let Some(parent) = chain.last() {
            graph.add_child(*parent, node).unwrap();
        }
        chain.push(node);
    }
    chain
}

#[test]
fn test_global_matrix_is_root_to_leaf_product() {
    let mut graph = SceneGraph::new();
    let chain = build_chain(&mut graph, 6);

    let mut expected = Mat4::identity();
    for (step, node) in chain.iter().enumerate() {
        expected *= local_transform(step).to_matrix();
        assert_relative_eq!(graph.global_matrix(*node).unwrap(), expected, epsilon = 1e-4);
    }

    graph.update_all();
    let leaf = *chain.last().unwrap();
    assert_relative_eq!(graph.final_world_matrix(leaf).unwrap(), expected, epsilon = 1e-4);
}

#[test]
fn test_reparent_global_preserves_pose() {
    let mut graph = SceneGraph::new();
    let chain = build_chain(&mut graph, 3);
    let other = build_chain(&mut graph, 2);
    let node = chain[2];

    let position = graph.position(node, true).unwrap();
    let rotation = graph.rotation(node, true).unwrap();
    let scale = graph.scale(node, true).unwrap();

    graph.set_parent(node, Some(other[1]), true).unwrap();

    assert_eq!(graph.node(node).unwrap().parent(), Some(other[1]));
    assert_relative_eq!(graph.position(node, true).unwrap(), position, epsilon = 1e-4);
    assert!(graph.rotation(node, true).unwrap().angle_to(&rotation) < 1e-3);
    assert_relative_eq!(graph.scale(node, true).unwrap(), scale, epsilon = 1e-4);
}

#[test]
fn test_reparent_uniform_scale_preserves_matrix() {
    let mut graph = SceneGraph::new();
    let old_parent = graph.create_node(NodeType::Basic);
    let new_parent = graph.create_node(NodeType::Basic);
    let node = graph.create_node(NodeType::Mesh);
    graph.add_child(old_parent, node).unwrap();

    graph.set_position(old_parent, Vec3::new(3.0, -1.0, 2.0), false).unwrap();
    graph.turn(old_parent, &Vec3::new(10.0, 45.0, 0.0)).unwrap();
    graph.set_position(new_parent, Vec3::new(-4.0, 0.0, 8.0), false).unwrap();
    graph.turn(new_parent, &Vec3::new(0.0, -30.0, 20.0)).unwrap();
    graph.set_scale(new_parent, Vec3::new(2.0, 2.0, 2.0), false).unwrap();
    graph.set_position(node, Vec3::new(1.0, 1.0, 1.0), false).unwrap();

    let before = graph.global_matrix(node).unwrap();
    graph.set_parent(node, Some(new_parent), true).unwrap();

    assert_relative_eq!(graph.global_matrix(node).unwrap(), before, epsilon = 1e-4);
}

#[test]
fn test_reparent_local_moves_global() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_node(NodeType::Basic);
    let node = graph.create_node(NodeType::Basic);
    graph.set_position(parent, Vec3::new(5.0, 0.0, 0.0), false).unwrap();
    graph.set_position(node, Vec3::new(1.0, 0.0, 0.0), false).unwrap();

    graph.set_parent(node, Some(parent), false).unwrap();

    assert_relative_eq!(graph.position(node, false).unwrap(), Vec3::new(1.0, 0.0, 0.0));
    assert_relative_eq!(graph.position(node, true).unwrap(), Vec3::new(6.0, 0.0, 0.0));
}

#[test]
fn test_detach_global_keeps_pose() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_node(NodeType::Basic);
    let node = graph.create_node(NodeType::Basic);
    graph.add_child(parent, node).unwrap();
    graph.set_position(parent, Vec3::new(0.0, 3.0, 0.0), false).unwrap();

    graph.set_parent(node, None, true).unwrap();

    assert_eq!(graph.node(node).unwrap().parent(), None);
    assert_relative_eq!(graph.position(node, false).unwrap(), Vec3::new(0.0, 3.0, 0.0));
    assert!(graph.node(parent).unwrap().children().is_empty());
}

#[test]
fn test_remove_first_child_in_insertion_order() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_node(NodeType::Basic);
    let children: Vec<_> = (0..4).map(|_| graph.create_node(NodeType::Basic)).collect();
    graph.add_children(parent, &children).unwrap();

    let mut removed = Vec::new();
    while let Some(first) = graph.node(parent).unwrap().children().first().copied() {
        assert!(graph.remove_first_child(parent).unwrap());
        removed.push(first);
    }

    assert_eq!(removed, children);
    assert!(!graph.remove_first_child(parent).unwrap());
    for child in &children {
        assert_eq!(graph.node(*child).unwrap().parent(), None);
    }
}

#[test]
fn test_remove_non_member_child() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_node(NodeType::Basic);
    let child = graph.create_node(NodeType::Basic);
    let stranger = graph.create_node(NodeType::Basic);
    graph.add_child(parent, child).unwrap();

    assert!(!graph.remove_child(parent, stranger).unwrap());
    assert_eq!(graph.node(parent).unwrap().children(), &[child]);

    assert_eq!(graph.remove_children(parent, &[stranger, child]).unwrap(), 1);
    assert!(graph.node(parent).unwrap().children().is_empty());
}

#[test]
fn test_clear_children_orphans_all() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_node(NodeType::Basic);
    let children: Vec<_> = (0..3).map(|_| graph.create_node(NodeType::Basic)).collect();
    graph.add_children(parent, &children).unwrap();

    graph.clear_children(parent).unwrap();

    assert!(graph.node(parent).unwrap().children().is_empty());
    assert_eq!(graph.top_level_nodes().len(), 4);
}

#[test]
fn test_cycles_are_rejected() {
    let mut graph = SceneGraph::new();
    let chain = build_chain(&mut graph, 4);

    let result = graph.set_parent(chain[0], Some(chain[3]), true);
    assert!(matches!(result, Err(SceneError::CycleDetected { .. })));
    assert_eq!(graph.node(chain[0]).unwrap().parent(), None);
    assert_eq!(graph.node(chain[2]).unwrap().children(), &[chain[3]]);
}

#[test]
fn test_removed_handles_report_not_found() {
    let mut graph = SceneGraph::new();
    let chain = build_chain(&mut graph, 3);

    assert_eq!(graph.remove_node(chain[1]).unwrap(), 2);
    assert!(matches!(graph.node(chain[2]), Err(SceneError::NodeNotFound(_))));
    assert!(graph.node(chain[0]).unwrap().children().is_empty());
}

#[test]
fn test_load_transformation_pushes_world_matrix() {
    use deferred_engine::render::{HeadlessCoordinator, RenderCoordinator};

    let mut graph = SceneGraph::new();
    let node = graph.create_node(NodeType::Mesh);
    graph.set_position(node, Vec3::new(0.0, 0.0, 7.0), false).unwrap();
    graph.update_all();

    let mut renderer = HeadlessCoordinator::new();
    graph.load_transformation(node, &mut renderer).unwrap();

    assert_relative_eq!(renderer.world_matrix().translation_part(), Vec3::new(0.0, 0.0, 7.0));
}
