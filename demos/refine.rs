use cartesian_mesh::CartesianMesh;
use ndarray::arr2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let knots = vec![vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]];
    let mesh = CartesianMesh::new(knots, 2)?;
    let fine = mesh.refine()?.refine()?.refine()?;

    log::info!("Coarse mesh: {} cells, cell area {}", mesh.nelems(), mesh.cell_area());
    log::info!("Fine mesh: {} cells, cell area {}", fine.nelems(), fine.cell_area());

    let bbox = arr2(&[[0.0, 1.0], [0.5, 2.0]]);
    let inside = fine.get_sub_elements(&bbox.view())?;
    println!("{} cells inside {:?}", inside.len(), bbox);
    for index in inside.iter().take(4) {
        println!("{:?}", fine.cells()[*index].bounds());
    }
    return Ok(());
}
