use ksrp_types::CompileResult;

use super::construct::{Construct, Member};
use super::view::{CodegenView, EnumView, FrameView, HeaderView, InstanceView, PrototypeView, ProtocolView};
use super::{banner, insert_artifact, Artifacts, Emitter, EmitterKind};

/* Emitter that assembles headers from a `Construct` tree */
#[derive(Debug, Default, Clone)]
pub struct ConstructEmitter;

impl ConstructEmitter {
  pub fn new() -> Self {
    Self
  }
}

fn includes(header: &HeaderView) -> Vec<Construct> {
  let system = header.clibraries.iter().map(|path| Construct::Include { path: path.clone(), system: true });
  let library = header.libraries.iter().map(|path| Construct::Include { path: path.clone(), system: false });
  vec![Construct::lines(system.collect()), Construct::lines(library.collect())]
}

fn enumeration(view: &EnumView) -> Construct {
  Construct::Enum {
    name: view.type_name.clone(),
    enumerators: view
      .enumerators
      .iter()
      .map(|e| (e.name.clone(), if e.explicit { Some(e.value) } else { None }))
      .collect(),
  }
}

fn prototype(view: &PrototypeView) -> Construct {
  Construct::Prototype {
    return_type: view.return_type.clone(),
    name: view.name.clone(),
    params: view.params.clone(),
  }
}

fn frame_blocks(frame: &FrameView) -> Vec<Construct> {
  let mut blocks = vec![Construct::Comment(format!("Frame '{}' (id {})", frame.name, frame.id))];

  blocks.extend(frame.fields.iter().filter_map(|field| field.enum_type.as_ref()).map(enumeration));

  let constants = frame
    .fields
    .iter()
    .flat_map(|field| &field.constants)
    .map(|constant| Construct::define(&constant.name, &constant.value))
    .collect();
  blocks.push(Construct::lines(constants));

  blocks.push(Construct::Struct {
    name: frame.type_name.clone(),
    packed: true,
    members: frame
      .fields
      .iter()
      .map(|field| Member::placed(&field.storage_type, &field.name, field.offset, field.width))
      .collect(),
  });

  blocks.push(Construct::lines(vec![
    Construct::define(&frame.size_constant.name, &frame.size_constant.value),
    Construct::StaticAssert {
      condition: format!("sizeof({}) == {}", frame.type_name, frame.size_constant.name),
      message: frame.size_assert.clone(),
    },
    Construct::define(&frame.type_id.name, &frame.type_id.value),
  ]));

  blocks.push(enumeration(&frame.field_ids));
  blocks.push(Construct::lines(frame.fields.iter().map(|field| prototype(&field.getter)).collect()));
  blocks.push(Construct::lines(frame.fields.iter().map(|field| prototype(&field.setter)).collect()));
  blocks
}

fn protocol_header(protocol: &ProtocolView) -> Construct {
  let mut body = vec![Construct::Comment(banner(Some(protocol.source.as_str())))];
  body.extend(includes(&protocol.header));
  body.push(Construct::group(
    format!("Frame ids of subsystem '{}'", protocol.subsystem),
    vec![enumeration(&protocol.frame_ids)],
  ));
  for frame in &protocol.frames {
    body.extend(frame_blocks(frame));
  }
  Construct::Guard { name: protocol.header.guard.clone(), body }
}

fn instance_header(instance: &InstanceView) -> Construct {
  let mut body = vec![Construct::Comment(banner(None))];
  body.extend(includes(&instance.header));

  let frames = instance.members.iter().map(|m| Member::plain(&m.frame_type, &m.frame_member));
  let clocks = instance.members.iter().map(|m| Member::plain(&instance.clock_type, &m.clock_member));
  body.push(Construct::Struct {
    name: instance.type_name.clone(),
    packed: false,
    members: frames.chain(clocks).collect(),
  });
  body.push(Construct::lines(instance.prototypes.iter().map(prototype).collect()));

  Construct::Guard { name: instance.header.guard.clone(), body }
}

fn common_header(view: &CodegenView) -> Construct {
  let mut body = vec![Construct::Comment(banner(None))];
  body.extend(includes(&view.common));
  body.push(Construct::group("Subsystem ids", vec![enumeration(&view.subsystem_ids)]));
  Construct::Guard { name: view.common.guard.clone(), body }
}

fn utils_header(view: &CodegenView) -> Construct {
  let mut body = vec![Construct::Comment(banner(None))];
  body.extend(includes(&view.utils));
  body.push(Construct::define(&view.subsystem_count.name, &view.subsystem_count.value));
  for protocol in &view.protocols {
    body.push(Construct::lines(protocol.dispatch.iter().map(prototype).collect()));
  }
  Construct::Guard { name: view.utils.guard.clone(), body }
}

impl Emitter for ConstructEmitter {
  fn kind(&self) -> EmitterKind {
    EmitterKind::Construct
  }

  fn emit(&self, view: &CodegenView) -> CompileResult<Artifacts> {
    let mut artifacts = Artifacts::new();

    for protocol in &view.protocols {
      insert_artifact(&mut artifacts, &protocol.header.path, protocol_header(protocol).to_string())?;
      insert_artifact(
        &mut artifacts,
        &protocol.instance.header.path,
        instance_header(&protocol.instance).to_string(),
      )?;
    }
    insert_artifact(&mut artifacts, &view.common.path, common_header(view).to_string())?;
    insert_artifact(&mut artifacts, &view.utils.path, utils_header(view).to_string())?;

    tracing::info!(emitter = %self.kind(), artifacts = artifacts.len(), "rendered artifacts");
    Ok(artifacts)
  }
}
