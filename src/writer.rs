//! Configuration file renderer.
//!
//! Takes the resolved port descriptors and the discovered NSA documents
//! and writes the full set of per-participant files: provider port and
//! runtime configuration, resource-manager YAML and log configuration,
//! TAC files, start/stop scripts, a database bootstrap script, and the
//! DDS peer discovery list.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};

use crate::nml::NsaDocument;
use crate::peers::Peer;
use crate::resolver::PortDescriptor;
use crate::stp::{canonicalize_network_urn, NSI_NETWORK_URN_PREFIX};

// Provider daemon start/stop scripts, one pair for all instances.
const PROVIDER_START_SCRIPT: &str = r#"#!/bin/bash

for i in `ls nsa*.tac`; do
  if [ -f $i ]; then
    echo "Starting $i with pid file ${i%.*}.pid"
    nohup twistd -noy $i --pidfile ${i%.*}.pid &
  fi
done
"#;

const PROVIDER_STOP_SCRIPT: &str = r#"#!/bin/bash

for i in `ls nsa*.pid`; do
  if [ -f $i ]; then
    echo "Stopping $i."
    kill -9 `cat $i`
  fi
done
"#;

const RM_START_SCRIPT: &str = r#"#! /bin/bash

export HOME=.

for i in `ls $HOME/config/sense*.yaml`; do
  if [ -f $i ]; then
    path=${i%.*}
    root=${path##*/}

    nohup /usr/bin/java \
        -Xmx1024m -Djava.net.preferIPv4Stack=true \
        -Dbasedir=$HOME \
        -Dlogback.configurationFile=file:$path.xml \
        -jar $HOME/rm/target/rm-0.1.0.jar \
        --spring.config.name=$root > /dev/null 2>&1 &
    echo $! > $root.pid
  fi
done
"#;

const RM_STOP_SCRIPT: &str = r#"#!/bin/bash

for i in `ls sense*.pid`; do
  if [ -f $i ]; then
    echo "Stopping $i."
    kill -9 `cat $i`
  fi
done
"#;

const DB_SCRIPT_START: &str = r#"#!/bin/bash
set -e
if [ $# != 1 ]; then
    echo "usage: $0 <postgres user> "
    exit
fi
echo "Creating user account sense databases."
psql -U $1 <<'EOF'
"#;

/// Renders and writes every generated file for one run.
pub struct ConfigWriter {
    pub user_id: String,
    pub password: String,
    pub schema_file: PathBuf,
    pub rm_template_file: PathBuf,
    pub log_template_file: PathBuf,
    pub out_dir: PathBuf,
}

impl ConfigWriter {
    /// Main control loop: one provider/RM configuration pair per
    /// (NSA, network) with usable ports, then the shared scripts and
    /// discovery files.
    pub fn write(
        &self,
        nsas: &[NsaDocument],
        ports: &[PortDescriptor],
        peers: &HashMap<String, Peer>,
    ) -> Result<()> {
        fs::create_dir_all(&self.out_dir).wrap_err_with(|| {
            format!("failed to create output directory '{}'", self.out_dir.display())
        })?;

        let rm_template = read_file(&self.rm_template_file)?;
        let log_template = read_file(&self.log_template_file)?;

        let mut count = 0;
        for nsa in nsas {
            info!("processing NSA {}", nsa.id);
            for network_id in &nsa.network_ids {
                info!("processing NSA {}, topology {}", nsa.id, network_id);
                if self.write_nsa(&rm_template, &log_template, &nsa.id, network_id, ports, peers, count)? {
                    count += 1;
                }
            }
        }

        self.write_tac(count)?;
        self.write_scripts()?;
        self.write_schema(count)?;
        self.write_discovery(count)?;
        Ok(())
    }

    /// Write the provider port configuration, provider runtime
    /// configuration, RM configuration, and RM log configuration for one
    /// network. Returns false (and advances nothing) when the network has
    /// no usable ports.
    #[allow(clippy::too_many_arguments)]
    fn write_nsa(
        &self,
        rm_template: &str,
        log_template: &str,
        provider_nsa_id: &str,
        network_id: &str,
        ports: &[PortDescriptor],
        peers: &HashMap<String, Peer>,
        count: usize,
    ) -> Result<bool> {
        let mut lines: Vec<String> = ports
            .iter()
            .filter(|p| p.network_id.eq_ignore_ascii_case(network_id))
            .map(PortDescriptor::config_line)
            .collect();
        if let Some(peer) = peers.get(network_id) {
            lines.extend(peer.port.iter().map(|p| p.config_line()));
        }
        if lines.is_empty() {
            warn!(
                "skipping provider {}, network {}: no usable ports",
                provider_nsa_id, network_id
            );
            return Ok(false);
        }

        let network = match canonicalize_network_urn(network_id) {
            Ok(network) => network,
            Err(e) => {
                warn!("skipping network {}: {}", network_id, e);
                return Ok(false);
            }
        };

        self.write_file(&format!("nsa{count}.nrm"), &(lines.join("\n") + "\n"))?;

        // Provider runtime configuration for this network.
        let conf = format!(
            "[service]\n\
             host=localhost\n\
             port={port}\n\
             network={network}\n\
             logfile=nsa{count}.log\n\
             nrmmap=nsa{count}.nrm\n\
             database=nsa{count}\n\
             dbuser={user}\n\
             dbpassword={password}\n\
             tls=false\n\
             [dud]",
            port = 9000 + count,
            network = network,
            count = count,
            user = self.user_id,
            password = self.password,
        );
        self.write_file(&format!("nsa{count}.conf"), &conf)?;

        // RM configuration from the user-supplied template. The provider
        // advertises generated topology and NSA URNs derived from the
        // canonical network name, so the RM must be told the same ones.
        let topology_urn = format!("{}{}:topology", NSI_NETWORK_URN_PREFIX, network);
        let nsa_urn = format!("{}{}:nsa", NSI_NETWORK_URN_PREFIX, network);
        let rm_config = fill_template(
            rm_template,
            &[
                ("server.port", (8000 + count).to_string()),
                ("provider.port", (9000 + count).to_string()),
                ("count", count.to_string()),
                ("user", self.user_id.clone()),
                ("password", self.password.clone()),
                ("network.id", topology_urn),
                ("nsa.id", nsa_urn),
            ],
        );
        self.write_file(&format!("sense{count}.yaml"), &rm_config)?;

        let log_config = log_template.replace(":filename:", &format!("sense-rm{count}.log"));
        self.write_file(&format!("sense{count}.xml"), &log_config)?;

        Ok(true)
    }

    /// One TAC file per provider instance.
    fn write_tac(&self, count: usize) -> Result<()> {
        for i in 0..count {
            let tac = format!(
                "#!/usr/bin/env python\n\
                 from opennsa import setup\n\
                 application = setup.createApplication('nsa{i}.conf', payload=True, debug=True)\n"
            );
            self.write_file(&format!("nsa{i}.tac"), &tac)?;
        }
        Ok(())
    }

    fn write_scripts(&self) -> Result<()> {
        self.write_file("opennsa_start.sh", PROVIDER_START_SCRIPT)?;
        self.write_file("opennsa_stop.sh", PROVIDER_STOP_SCRIPT)?;
        self.write_file("sense_start.sh", RM_START_SCRIPT)?;
        self.write_file("sense_stop.sh", RM_STOP_SCRIPT)?;
        Ok(())
    }

    /// Database bootstrap: one RM and one provider database per instance,
    /// all owned by a single shared user, plus the provider schema applied
    /// to each provider database.
    fn write_schema(&self, count: usize) -> Result<()> {
        let mut script = String::from(DB_SCRIPT_START);
        script.push_str(&format!(
            "CREATE USER {} WITH ENCRYPTED PASSWORD '{}';\n",
            self.user_id, self.password
        ));
        for i in 0..count {
            script.push_str(&format!(
                "CREATE DATABASE sense{i};\n\
                 GRANT ALL PRIVILEGES ON DATABASE sense{i} TO {user};\n\
                 CREATE DATABASE nsa{i};\n\
                 GRANT ALL PRIVILEGES ON DATABASE nsa{i} TO {user};\n",
                user = self.user_id,
            ));
        }
        script.push_str(&format!("EOF;\nexport PGPASSWORD='{}'\n", self.password));
        script.push_str(&format!(
            "for i in {{0..{last}}}\n\
             do\n   \
             echo \"Populating schema into database nsa$i.\"\n   \
             psql -U {user} -d nsa$i < opennsa-schema.sql\n\
             done\n",
            last = count as i64 - 1,
            user = self.user_id,
        ));
        self.write_file("database.sh", &script)?;

        let schema = read_file(&self.schema_file)?;
        self.write_file("opennsa-schema.sql", &schema)
    }

    /// DDS peer discovery list pointing at every provider instance.
    fn write_discovery(&self, count: usize) -> Result<()> {
        let mut lines = String::new();
        for i in 0..count {
            lines.push_str(&format!(
                "<peerURL type=\"application/vnd.ogf.nsi.nsa.v1+xml\">http://localhost:{}/NSI/discovery.xml</peerURL>\n",
                9000 + i
            ));
        }
        self.write_file("peer.xml", &lines)
    }

    fn write_file(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.out_dir.join(name);
        fs::write(&path, contents)
            .wrap_err_with(|| format!("failed to write '{}'", path.display()))
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).wrap_err_with(|| format!("failed to read '{}'", path.display()))
}

/// Replace `:token:` markers in a template.
fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (token, value) in values {
        out = out.replace(&format!(":{token}:"), value);
    }
    out
}
