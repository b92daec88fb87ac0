mod error;
mod loader;
mod manifest;
mod report;
mod writer;

pub use error::EndermiteError;
pub use loader::{load_project_dir, LoadedProject, COMPONENTS_DIR, PROJECT_MANIFEST_FILE};
pub use manifest::{run_statements, ComponentManifest, MethodManifest, ProjectManifest, Statement};
pub use report::BuildReport;
pub use writer::{
    render_pack_metadata, render_tag, DirectoryPackWriter, MemoryPackWriter, PackHandle,
    PackWriter, PACK_FORMAT, PACK_METADATA_FILE,
};

use em_compiler::{
    BuildOutput, ComponentDefinition, ProjectBuilder, ProjectDefinition, ResourceRegistry,
};
use tracing::{debug, info};

/// Owns the resource registry for a sequence of builds. The registry is
/// emptied before and after every build so definitions never leak between
/// projects.
#[derive(Debug, Default)]
pub struct Session {
    registry: ResourceRegistry,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn build(
        &mut self,
        project: &ProjectDefinition,
        components: Vec<ComponentDefinition>,
    ) -> Result<BuildOutput, EndermiteError> {
        self.registry.clear_all();
        let result = self.register_and_build(project, components);
        self.registry.clear_all();
        result
    }

    fn register_and_build(
        &mut self,
        project: &ProjectDefinition,
        components: Vec<ComponentDefinition>,
    ) -> Result<BuildOutput, EndermiteError> {
        for component in components {
            self.registry.register_component(component)?;
        }
        Ok(ProjectBuilder::new(project, &self.registry).build()?)
    }
}

pub fn build_project(
    project: &ProjectDefinition,
    components: Vec<ComponentDefinition>,
) -> Result<BuildOutput, EndermiteError> {
    Session::new().build(project, components)
}

pub fn write_output<W: PackWriter>(
    output: &BuildOutput,
    mut writer: W,
) -> Result<PackHandle, EndermiteError> {
    for function in &output.functions {
        writer.write(&function.relative_path(), &function.content())?;
    }
    for tag in &output.tags {
        writer.write_tag(&tag.relative_path(), &tag.members)?;
    }
    debug!(
        functions = output.functions.len(),
        tags = output.tags.len(),
        "wrote artifacts"
    );
    writer.finalize(&output.description)
}

/// Builds the project and writes it only if every component built.
pub fn build_and_write<W: PackWriter>(
    project: &ProjectDefinition,
    components: Vec<ComponentDefinition>,
    writer: W,
) -> Result<PackHandle, EndermiteError> {
    let output = build_project(project, components)?;
    let handle = write_output(&output, writer)?;
    info!(project = %project.name, "pack written");
    Ok(handle)
}
